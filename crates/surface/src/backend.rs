//! Interface to the platform texture surface the guard wraps.

use hs_common::{SurfaceError, TextureId, TransformMatrix};

/// Raw "new image available" notification installed on the backend.
///
/// The backend may invoke it from any thread, once per produced image, but
/// never synchronously from inside one of its own trait methods: those run
/// under the surface lock, and listeners are free to call back into the
/// surface.
pub type FrameAvailableCallback = Box<dyn Fn() + Send + Sync>;

/// A texture-backed surface: a consumer side bound to a GL texture, and a
/// producer side that a decoder renders into.
///
/// Implementations do not need to defend against use after release; the
/// guard never calls into a backend once it has been torn down.
pub trait SurfaceBackend: Send {
    /// Bind the consumer side to `texture_id` in the current GL context.
    fn attach_to_context(&mut self, texture_id: TextureId) -> Result<(), SurfaceError>;

    fn detach_from_context(&mut self) -> Result<(), SurfaceError>;

    fn set_default_buffer_size(&mut self, width: u32, height: u32);

    /// Latch the most recent producer image into the bound texture.
    fn update_image(&mut self) -> Result<(), SurfaceError>;

    fn transform_matrix(&self, out: &mut TransformMatrix);

    /// Timestamp of the latched image, in nanoseconds.
    fn timestamp(&self) -> i64;

    /// Install or clear the frame notification.
    fn set_frame_available_callback(&mut self, callback: Option<FrameAvailableCallback>);

    /// Release the producer-side window.
    fn release_producer(&mut self);

    /// Release the texture surface itself.
    fn release(&mut self);
}
