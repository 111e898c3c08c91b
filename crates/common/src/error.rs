//! Central error types (thiserror-based).
//!
//! Stale lifecycle calls are not errors and never show up here; they are
//! reported as [`Outcome::Ignored`](crate::Outcome::Ignored).

use thiserror::Error;

use crate::types::{TextureId, Verb};

/// Failures raised by a backing decoder session from one of its hooks.
///
/// The lifecycle controller passes these through untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("HW decoder init failed for {mime}: {reason}")]
    HwDecoderInit { mime: String, reason: String },

    #[error("Unsupported mime type for HW decode: {0}")]
    UnsupportedMime(String),

    #[error("Decoder rejected configuration: {0}")]
    ConfigRejected(String),

    #[error("Decoder {verb} failed: {reason}")]
    Hardware { verb: Verb, reason: String },

    #[error("Decoder session expired or invalid")]
    InvalidSession,
}

/// Rendering surface errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    /// The caller tried to attach a surface that is still bound to a texture.
    #[error("Surface already attached to texture {texture_id}, detach it first")]
    AlreadyAttached { texture_id: TextureId },

    #[error("Surface {op} failed: {reason}")]
    Backend { op: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn already_attached_names_the_texture() {
        let err = SurfaceError::AlreadyAttached {
            texture_id: TextureId(7),
        };
        assert!(err.to_string().contains("texture 7"));
    }

    #[test]
    fn hardware_error_names_the_verb() {
        let err = DecodeError::Hardware {
            verb: Verb::Start,
            reason: "codec busy".into(),
        };
        assert_eq!(err.to_string(), "Decoder start failed: codec busy");
    }
}
