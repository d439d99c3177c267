//! Pose-tolerance check: is a pose close enough to its target to count as placed?

use nalgebra::UnitQuaternion;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::pose::Pose;

pub const DEFAULT_MAX_DISTANCE: f32 = 0.1;
pub const DEFAULT_MAX_ANGLE_DEGREES: f32 = 10.0;

/// Linear and angular slack allowed around a target pose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerance {
    /// Meters.
    pub max_distance: f32,
    /// Degrees.
    pub max_angle_degrees: f32,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            max_distance: DEFAULT_MAX_DISTANCE,
            max_angle_degrees: DEFAULT_MAX_ANGLE_DEGREES,
        }
    }
}

impl Tolerance {
    pub fn new(max_distance: f32, max_angle_degrees: f32) -> Self {
        Self {
            max_distance,
            max_angle_degrees,
        }
    }

    /// Rejects negative or non-finite limits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.max_distance.is_finite() || self.max_distance < 0.0 {
            return Err(ConfigError::InvalidTolerance {
                field: "max_distance",
                value: self.max_distance,
            });
        }
        if !self.max_angle_degrees.is_finite() || self.max_angle_degrees < 0.0 {
            return Err(ConfigError::InvalidTolerance {
                field: "max_angle_degrees",
                value: self.max_angle_degrees,
            });
        }
        Ok(())
    }
}

/// Shortest-arc angle between two orientations, in degrees (`0..=180`).
pub fn angle_degrees(a: &UnitQuaternion<f32>, b: &UnitQuaternion<f32>) -> f32 {
    a.angle_to(b).to_degrees()
}

pub fn within_distance(current: &Pose, target: &Pose, max_distance: f32) -> bool {
    nalgebra::distance(&current.position, &target.position) <= max_distance
}

pub fn within_angle(current: &Pose, target: &Pose, max_angle_degrees: f32) -> bool {
    angle_degrees(&current.orientation, &target.orientation) <= max_angle_degrees
}

/// Both limits inclusive; no partial credit.
pub fn is_acceptable(current: &Pose, target: &Pose, tolerance: &Tolerance) -> bool {
    within_distance(current, target, tolerance.max_distance)
        && within_angle(current, target, tolerance.max_angle_degrees)
}
