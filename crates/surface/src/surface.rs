//! Release-safe guard around a texture-backed rendering surface.
//!
//! A `TextureSurface` is used from a producer thread (image updates,
//! attach/detach) while release may be requested from any thread. Besides
//! the explicit [`TextureSurface::release`], the backing resource can be
//! finalized in two other ways:
//!
//! - the host memory manager reports reclamation through a
//!   [`ReclaimHandle`], from whatever thread it runs on;
//! - the last `TextureSurface` handle is dropped.
//!
//! All three paths funnel through one teardown routine. It runs under the
//! surface lock and is gated by an atomic check-and-set, so the backend is
//! torn down exactly once. Once either the released or the finalized flag
//! is set the surface is *effectively released*: every mutator becomes a
//! no-op and the flags are never cleared.
//!
//! Attaching a surface that is still attached is the one call that fails
//! loudly, with [`SurfaceError::AlreadyAttached`]: it means the caller lost
//! track of a texture binding.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, info, trace};

use hs_common::{Outcome, SurfaceError, SurfaceOptions, TextureId, TransformMatrix};

use crate::backend::{FrameAvailableCallback, SurfaceBackend};
use crate::executor::{ExecutorHandle, FrameExecutor};

/// Listener for newly available images. Receives the guard, never the raw
/// backend.
///
/// The backend keeps the listener for as long as it is registered, so a
/// listener must not capture a `TextureSurface`: that handle would keep the
/// surface alive and dropping the last outside handle would never finalize
/// it. Use the `&TextureSurface` argument, or capture a [`ReclaimHandle`].
pub type FrameListener = Arc<dyn Fn(&TextureSurface) + Send + Sync>;

type ReleaseHook = Box<dyn FnOnce(TextureId, ReleaseCause) + Send>;

/// Which path tore the surface down.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReleaseCause {
    Explicit,
    Finalized,
}

struct SurfaceState {
    backend: Box<dyn SurfaceBackend>,
    texture_id: TextureId,
    attached: bool,
    released: bool,
    finalized: bool,
    /// Last timestamp read from the backend.
    timestamp: i64,
    release_hook: Option<ReleaseHook>,
}

impl SurfaceState {
    fn effectively_released(&self) -> bool {
        self.released || self.finalized
    }
}

struct Shared {
    label: String,
    state: Mutex<SurfaceState>,
    /// Set by whichever path wins the teardown.
    torn_down: AtomicBool,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SurfaceState> {
        self.state.lock()
    }

    /// Mark the surface released by `cause` and tear the backend down if no
    /// other path did yet. Returns the release hook and its texture for the
    /// caller to run once the lock is dropped.
    fn shut_down(
        &self,
        state: &mut SurfaceState,
        cause: ReleaseCause,
    ) -> Option<(ReleaseHook, TextureId)> {
        match cause {
            ReleaseCause::Explicit => state.released = true,
            ReleaseCause::Finalized => state.finalized = true,
        }

        if self.torn_down.swap(true, Ordering::AcqRel) {
            trace!(surface = %self.label, ?cause, "Surface already torn down");
            return None;
        }

        state.attached = false;
        state.backend.set_frame_available_callback(None);
        state.backend.release_producer();
        state.backend.release();

        info!(
            surface = %self.label,
            texture_id = %state.texture_id,
            ?cause,
            "Texture surface released"
        );
        let texture_id = state.texture_id;
        state.release_hook.take().map(|hook| (hook, texture_id))
    }

    fn finish(&self, cause: ReleaseCause) {
        let hook = {
            let mut state = self.lock();
            self.shut_down(&mut state, cause)
        };
        if let Some((hook, texture_id)) = hook {
            hook(texture_id, cause);
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        self.finish(ReleaseCause::Finalized);
    }
}

/// Guard around a texture-backed surface.
///
/// Cloning yields another handle to the same surface. Dropping the last
/// handle finalizes it.
///
/// # Example
///
/// ```ignore
/// let surface = TextureSurface::new(Box::new(platform_surface), TextureId(5));
/// surface.set_frame_listener(Some(Arc::new(|s: &TextureSurface| {
///     s.update_image().ok();
/// })), Some(&render_thread));
///
/// // Any thread, any number of times.
/// surface.release();
/// ```
#[derive(Clone)]
pub struct TextureSurface {
    shared: Arc<Shared>,
}

impl TextureSurface {
    /// Wrap a backend whose consumer side is already bound to `texture_id`.
    pub fn new(backend: Box<dyn SurfaceBackend>, texture_id: TextureId) -> Self {
        Self::with_options(backend, texture_id, SurfaceOptions::default())
    }

    pub fn with_options(
        mut backend: Box<dyn SurfaceBackend>,
        texture_id: TextureId,
        options: SurfaceOptions,
    ) -> Self {
        if let Some((width, height)) = options.default_buffer_size {
            backend.set_default_buffer_size(width, height);
        }
        debug!(surface = %options.label, %texture_id, "Texture surface created");

        Self {
            shared: Arc::new(Shared {
                label: options.label,
                state: Mutex::new(SurfaceState {
                    backend,
                    texture_id,
                    attached: true,
                    released: false,
                    finalized: false,
                    timestamp: 0,
                    release_hook: None,
                }),
                torn_down: AtomicBool::new(false),
            }),
        }
    }

    /// Build the backend for `texture_id` with `factory`, then wrap it.
    pub fn open<F>(
        texture_id: TextureId,
        options: SurfaceOptions,
        factory: F,
    ) -> Result<Self, SurfaceError>
    where
        F: FnOnce(TextureId) -> Result<Box<dyn SurfaceBackend>, SurfaceError>,
    {
        let backend = factory(texture_id)?;
        Ok(Self::with_options(backend, texture_id, options))
    }

    pub fn label(&self) -> &str {
        &self.shared.label
    }

    // ------------------------------------------------------------------
    // Texture binding
    // ------------------------------------------------------------------

    /// Bind to `texture_id`.
    ///
    /// # Errors
    ///
    /// [`SurfaceError::AlreadyAttached`] if the surface is still bound;
    /// call [`detach`](Self::detach) first. Backend failures pass through.
    pub fn attach(&self, texture_id: TextureId) -> Result<Outcome, SurfaceError> {
        let mut state = self.shared.lock();
        if state.effectively_released() {
            return Ok(Outcome::Ignored);
        }
        if state.attached {
            return Err(SurfaceError::AlreadyAttached {
                texture_id: state.texture_id,
            });
        }

        state.backend.attach_to_context(texture_id)?;
        state.texture_id = texture_id;
        state.attached = true;
        debug!(surface = %self.shared.label, %texture_id, "Surface attached");
        Ok(Outcome::Applied)
    }

    pub fn detach(&self) -> Result<Outcome, SurfaceError> {
        let mut state = self.shared.lock();
        if !state.attached || state.effectively_released() {
            return Ok(Outcome::Ignored);
        }

        state.backend.detach_from_context()?;
        state.attached = false;
        debug!(surface = %self.shared.label, texture_id = %state.texture_id, "Surface detached");
        Ok(Outcome::Applied)
    }

    pub fn is_attached(&self) -> bool {
        let state = self.shared.lock();
        state.attached && !state.effectively_released()
    }

    // ------------------------------------------------------------------
    // Images
    // ------------------------------------------------------------------

    /// Latch the next producer image into the texture. Ignored unless
    /// attached and not released.
    pub fn update_image(&self) -> Result<Outcome, SurfaceError> {
        let mut state = self.shared.lock();
        if !state.attached || state.effectively_released() {
            return Ok(Outcome::Ignored);
        }

        state.backend.update_image()?;
        state.timestamp = state.backend.timestamp();
        Ok(Outcome::Applied)
    }

    pub fn set_default_buffer_size(&self, width: u32, height: u32) -> Outcome {
        let mut state = self.shared.lock();
        if state.effectively_released() {
            return Outcome::Ignored;
        }
        state.backend.set_default_buffer_size(width, height);
        Outcome::Applied
    }

    /// Copy the texture transform into `out`. After release `out` is left
    /// untouched.
    pub fn transform_matrix(&self, out: &mut TransformMatrix) -> Outcome {
        let state = self.shared.lock();
        if state.effectively_released() {
            return Outcome::Ignored;
        }
        state.backend.transform_matrix(out);
        Outcome::Applied
    }

    /// Timestamp of the latched image; the last known one after release.
    pub fn timestamp(&self) -> i64 {
        let mut state = self.shared.lock();
        if !state.effectively_released() {
            state.timestamp = state.backend.timestamp();
        }
        state.timestamp
    }

    /// The texture last bound, also after release.
    pub fn texture_id(&self) -> TextureId {
        self.shared.lock().texture_id
    }

    // ------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------

    /// Register `listener` for new images, replacing any previous one, or
    /// clear the registration with `None`.
    ///
    /// Without an executor the listener runs on whichever thread the
    /// backend signals from. With one, it is posted to the executor's
    /// thread. The listener is not invoked once teardown has begun.
    ///
    /// A listener capturing a strong `TextureSurface` keeps the surface
    /// alive through the backend; see [`FrameListener`].
    pub fn set_frame_listener(
        &self,
        listener: Option<FrameListener>,
        executor: Option<&FrameExecutor>,
    ) -> Outcome {
        let mut state = self.shared.lock();
        if state.effectively_released() {
            return Outcome::Ignored;
        }

        let callback = listener.map(|listener| {
            let surface = Arc::downgrade(&self.shared);
            let executor = executor.map(FrameExecutor::handle);
            Box::new(move || dispatch_frame(&surface, &listener, executor.as_ref()))
                as FrameAvailableCallback
        });
        state.backend.set_frame_available_callback(callback);
        Outcome::Applied
    }

    // ------------------------------------------------------------------
    // Release
    // ------------------------------------------------------------------

    /// Release the surface. Idempotent, and safe after finalization.
    ///
    /// The backend's producer side and texture are released once, then the
    /// release hook runs, outside the lock.
    pub fn release(&self) {
        self.shared.finish(ReleaseCause::Explicit);
    }

    /// Register cleanup to run once the surface is torn down, by whichever
    /// path gets there first. The hook receives the last bound texture and
    /// the path that tore the surface down. Ignored after release.
    ///
    /// The surface owns the hook until teardown, so the hook must not
    /// capture a `TextureSurface`. Such a handle keeps the surface alive and
    /// the last-drop finalization never happens. Capture a
    /// [`ReclaimHandle`] if the hook needs to refer back to the surface.
    pub fn set_release_hook(
        &self,
        hook: impl FnOnce(TextureId, ReleaseCause) + Send + 'static,
    ) -> Outcome {
        let mut state = self.shared.lock();
        if state.effectively_released() {
            return Outcome::Ignored;
        }
        state.release_hook = Some(Box::new(hook));
        Outcome::Applied
    }

    /// Whether [`release`](Self::release) was called.
    pub fn is_released(&self) -> bool {
        self.shared.lock().released
    }

    /// Released explicitly or finalized.
    pub fn is_effectively_released(&self) -> bool {
        self.shared.lock().effectively_released()
    }

    /// Handle for the host memory manager to report reclamation.
    pub fn reclaim_handle(&self) -> ReclaimHandle {
        ReclaimHandle {
            shared: Arc::downgrade(&self.shared),
        }
    }
}

impl PartialEq for TextureSurface {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl Eq for TextureSurface {}

impl fmt::Debug for TextureSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("TextureSurface")
            .field("label", &self.shared.label)
            .field("texture_id", &state.texture_id)
            .field("attached", &state.attached)
            .field("released", &state.released)
            .field("finalized", &state.finalized)
            .finish()
    }
}

/// Weak handle through which the host reports that the backing resource
/// was reclaimed. Does not keep the surface alive.
#[derive(Clone)]
pub struct ReclaimHandle {
    shared: Weak<Shared>,
}

impl ReclaimHandle {
    /// Finalize the surface. No-op if it is already gone or torn down.
    pub fn reclaim(&self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.finish(ReleaseCause::Finalized);
        }
    }
}

impl fmt::Debug for ReclaimHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReclaimHandle")
            .field("alive", &(self.shared.strong_count() > 0))
            .finish()
    }
}

fn dispatch_frame(
    surface: &Weak<Shared>,
    listener: &FrameListener,
    executor: Option<&ExecutorHandle>,
) {
    match executor {
        None => notify(surface, listener),
        Some(executor) => {
            let surface = surface.clone();
            let listener = listener.clone();
            executor.post(move || notify(&surface, &listener));
        }
    }
}

fn notify(surface: &Weak<Shared>, listener: &FrameListener) {
    let Some(shared) = surface.upgrade() else {
        return;
    };
    if shared.torn_down.load(Ordering::Acquire) {
        return;
    }
    listener(&TextureSurface { shared });
}
