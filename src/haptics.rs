//! Fire-and-forget haptic pulses.
//!
//! The state machine only emits [`HapticRequest`] values; [`HapticDispatcher`] hands them to
//! an async [`HapticDevice`] on a detached tokio task that nobody awaits.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::error::HapticError;
use crate::pose::HandId;

/// A single vibration request for one hand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HapticRequest {
    pub hand: HandId,
    pub duration_secs: f32,
    /// Hz.
    pub frequency: f32,
    /// `0.0..=1.0`.
    pub amplitude: f32,
}

impl HapticRequest {
    pub const HOVER_DURATION_SECS: f32 = 0.15;
    pub const HOVER_FREQUENCY: f32 = 5.0;
    pub const HOVER_AMPLITUDE: f32 = 1.0;

    /// The short pulse played when a hand starts hovering a part.
    pub fn hover_pulse(hand: HandId) -> Self {
        Self {
            hand,
            duration_secs: Self::HOVER_DURATION_SECS,
            frequency: Self::HOVER_FREQUENCY,
            amplitude: Self::HOVER_AMPLITUDE,
        }
    }
}

/// Host vibration API.
#[async_trait]
pub trait HapticDevice: Send + Sync {
    async fn pulse(&self, request: HapticRequest) -> Result<(), HapticError>;
}

/// Spawns haptic requests onto a runtime without tracking them.
#[derive(Clone)]
pub struct HapticDispatcher {
    device: Arc<dyn HapticDevice>,
    runtime: Handle,
}

impl std::fmt::Debug for HapticDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HapticDispatcher").finish_non_exhaustive()
    }
}

impl HapticDispatcher {
    pub fn new(device: Arc<dyn HapticDevice>, runtime: Handle) -> Self {
        Self { device, runtime }
    }

    /// Uses the runtime of the calling context. Panics outside a tokio runtime, like
    /// [`Handle::current`].
    pub fn on_current_runtime(device: Arc<dyn HapticDevice>) -> Self {
        Self::new(device, Handle::current())
    }

    /// Starts the pulse and returns immediately. The handle is only useful to tests; callers
    /// normally drop it.
    pub fn dispatch(&self, request: HapticRequest) -> JoinHandle<()> {
        let device = Arc::clone(&self.device);
        self.runtime.spawn(async move {
            if let Err(err) = device.pulse(request).await {
                tracing::warn!(hand = request.hand.0, error = %err, "haptic pulse dropped");
            }
        })
    }
}
