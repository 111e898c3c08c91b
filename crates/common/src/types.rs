//! Small newtypes shared across the decoder and surface crates.

use std::fmt;

/// GL texture name that a rendering surface is bound to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

impl TextureId {
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for TextureId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

/// Opaque handle to a platform output surface a decoder can render into.
///
/// The decoder never dereferences it; it is only handed to the backend.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceHandle(pub u64);

/// Where a video decoder delivers its output images.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Decoded images are copied out as CPU-visible buffers.
    #[default]
    Buffer,
    /// Decoded images are rendered straight into an output surface.
    Surface,
}

/// Column-major 4x4 texture-coordinate transform, as reported by the surface.
pub type TransformMatrix = [f32; 16];

/// Lifecycle verb requested by a caller of the decoder controller.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Verb {
    Create,
    Configure,
    Start,
    Pause,
    Resume,
    Flush,
    Stop,
    Reset,
    Destroy,
    Release,
}

impl Verb {
    /// All verbs, in table order.
    pub const ALL: [Verb; 10] = [
        Verb::Create,
        Verb::Configure,
        Verb::Start,
        Verb::Pause,
        Verb::Resume,
        Verb::Flush,
        Verb::Stop,
        Verb::Reset,
        Verb::Destroy,
        Verb::Release,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Configure => "configure",
            Self::Start => "start",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Flush => "flush",
            Self::Stop => "stop",
            Self::Reset => "reset",
            Self::Destroy => "destroy",
            Self::Release => "release",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of a lifecycle call that was not an error.
///
/// `Ignored` means the call was stale or redundant for the current state
/// and had no effect at all.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Ignored,
}

impl Outcome {
    pub fn is_applied(self) -> bool {
        self == Self::Applied
    }
}
