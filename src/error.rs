use thiserror::Error;

/// Errors raised while building or loading a [`PlacementConfig`](crate::PlacementConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid tolerance `{field}`: {value} (must be finite and non-negative)")]
    InvalidTolerance { field: &'static str, value: f32 },

    #[error("failed to read placement config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse placement config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure reported by a haptic device. Only ever logged.
#[derive(Debug, Error)]
#[error("haptic pulse failed: {0}")]
pub struct HapticError(pub String);
