//! Configuration structs for the decoder controller and the surface guard.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading a configuration document.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// What the decoder controller does with its recorded state when a
/// delegate hook fails after the state was already advanced.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookFailurePolicy {
    /// Restore the state held before the verb. `release` never rolls back.
    #[default]
    Rollback,
    /// Keep the target state even though the backend did not get there.
    Advance,
}

/// Decoder lifecycle controller configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleOptions {
    /// Name attached to every log event of this controller.
    pub label: String,
    pub hook_failure: HookFailurePolicy,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            label: "decoder".to_string(),
            hook_failure: HookFailurePolicy::Rollback,
        }
    }
}

impl LifecycleOptions {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_hook_failure(mut self, policy: HookFailurePolicy) -> Self {
        self.hook_failure = policy;
        self
    }
}

/// Texture surface guard configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceOptions {
    /// Name attached to every log event of this surface.
    pub label: String,
    /// Producer buffer size applied right after construction.
    pub default_buffer_size: Option<(u32, u32)>,
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self {
            label: "surface".to_string(),
            default_buffer_size: None,
        }
    }
}

impl SurfaceOptions {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_default_buffer_size(mut self, width: u32, height: u32) -> Self {
        self.default_buffer_size = Some((width, height));
        self
    }
}
