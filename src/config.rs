//! Per-part placement configuration.
//!
//! Set once before the part receives its first callback. Every field has a default, so a
//! JSON document only needs to name what it overrides:
//!
//! ```json
//! {
//!   "target": { "position": [0.0, 1.0, 0.0], "orientation": [0.0, 0.0, 0.0, 1.0] },
//!   "tolerance": { "max_distance": 0.05 },
//!   "snap_and_detach": false
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::placement::Tolerance;
use crate::pose::{AttachmentFlags, Pose};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Home pose. A part without a target is never acceptable.
    pub target: Option<Pose>,
    pub tolerance: Tolerance,
    /// Force a release as soon as a held part first becomes acceptable.
    pub snap_and_detach: bool,
    /// Clear the kinematic flag (instead of setting it) when re-grabbing a placed part.
    pub release_kinematic_on_regrab: bool,
    pub attachment_flags: AttachmentFlags,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            target: None,
            tolerance: Tolerance::default(),
            snap_and_detach: true,
            release_kinematic_on_regrab: false,
            attachment_flags: AttachmentFlags::part_default(),
        }
    }
}

impl PlacementConfig {
    pub fn with_target(target: Pose) -> Self {
        Self {
            target: Some(target),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tolerance.validate()
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}
