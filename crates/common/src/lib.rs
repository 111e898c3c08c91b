//! `hs-common` — Shared types, configuration, and errors for the HDR sample engine.
//!
//! This crate is the foundation that the lifecycle crates depend on:
//!
//! - **Types**: `TextureId`, `SurfaceHandle`, `OutputMode`, `TransformMatrix`
//! - **Errors**: `DecodeError`, `SurfaceError` (thiserror-based)
//! - **Config**: `LifecycleOptions`, `HookFailurePolicy`, `SurfaceOptions`

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used items at crate root
pub use config::{ConfigError, HookFailurePolicy, LifecycleOptions, SurfaceOptions};
pub use error::{DecodeError, SurfaceError};
pub use types::{Outcome, OutputMode, SurfaceHandle, TextureId, TransformMatrix, Verb};
