//! Grabbable parts that snap onto a target pose.
//!
//! This crate defines:
//! - [`placement`]: the pose-tolerance test ([`is_acceptable`]).
//! - [`grab`]: the pure grab/place state machine ([`transition`]).
//! - [`PlaceablePart`]: the adapter a host engine drives from its hover/attach callbacks.
//! - [`host`]: the capabilities a host lends to a part (physics, transform, marker, hand).
//! - [`haptics`]: fire-and-forget haptic pulses on a tokio runtime.
//!
//! The library never installs a `tracing` subscriber; hosts decide where logs go.

pub mod config;
pub mod error;
pub mod grab;
pub mod haptics;
pub mod host;
pub mod part;
pub mod placement;
pub mod pose;

// Re-export for hosts so they can build poses without declaring a direct dependency on
// `nalgebra`.
pub use nalgebra;

pub use config::PlacementConfig;
pub use error::{ConfigError, HapticError};
pub use grab::{transition, Effect, GrabEvent, GrabPhase, GrabSnapshot, HoverFrame, Transition};
pub use haptics::{HapticDevice, HapticDispatcher, HapticRequest};
pub use host::{HandHandle, MarkerHandle, PhysicsHandle, PoseHandle};
pub use part::PlaceablePart;
pub use placement::{is_acceptable, Tolerance};
pub use pose::{AttachmentFlags, GrabType, HandId, Pose};
