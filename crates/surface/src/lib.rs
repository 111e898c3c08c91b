//! `hs-surface` — Release-safe GPU texture surfaces.
//!
//! Wraps a texture-backed rendering surface so it can be attached,
//! updated, and released from several threads, including a finalizer path
//! the application does not control.
//!
//! ## Module Overview
//!
//! - [`backend`] — `SurfaceBackend`, the platform surface interface
//! - [`surface`] — `TextureSurface`, the guard, and `ReclaimHandle`
//! - [`executor`] — `FrameExecutor`, a worker thread for frame listeners
//!
//! ## Usage
//!
//! ```ignore
//! use hs_surface::{FrameExecutor, TextureSurface};
//!
//! let render_thread = FrameExecutor::spawn("render")?;
//! let surface = TextureSurface::new(Box::new(platform_surface), TextureId(5));
//!
//! surface.set_frame_listener(
//!     Some(Arc::new(|s: &TextureSurface| {
//!         s.update_image().ok();
//!     })),
//!     Some(&render_thread),
//! );
//!
//! // Later, from any thread. Safe even if the host already reclaimed it.
//! surface.release();
//! ```

pub mod backend;
pub mod executor;
pub mod surface;

pub use backend::{FrameAvailableCallback, SurfaceBackend};
pub use executor::{ExecutorHandle, FrameExecutor};
pub use surface::{FrameListener, ReclaimHandle, ReleaseCause, TextureSurface};
