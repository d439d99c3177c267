//! Grab / place state machine.
//!
//! [`transition`] is a pure function of the current [`GrabSnapshot`], the part's
//! [`PlacementConfig`] and one [`GrabEvent`]. It returns the next snapshot plus the ordered
//! list of [`Effect`]s the host adapter must apply. Nothing here touches the engine.

use serde::{Deserialize, Serialize};

use crate::config::PlacementConfig;
use crate::haptics::HapticRequest;
use crate::placement::is_acceptable;
use crate::pose::{AttachmentFlags, GrabType, HandId, Pose};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GrabPhase {
    /// Not held, physics as the host left it.
    #[default]
    Free,
    /// Attached to a hand.
    Held,
    /// Sitting exactly on the target, kinematic with gravity off.
    Placed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GrabSnapshot {
    pub phase: GrabPhase,
    /// Result of the last acceptability evaluation; used to fire on the rising edge only.
    pub was_acceptable: bool,
}

/// What the hand reported during one hover update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoverFrame {
    pub hand: HandId,
    pub grab_starting: Option<GrabType>,
    pub grab_ending: bool,
    /// Whether the host has the part attached to a hand. Authoritative over [`GrabPhase`].
    pub attached: bool,
    /// The part's pose at the start of the frame.
    pub pose: Pose,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GrabEvent {
    HoverBegin { hand: HandId },
    HoverEnd { hand: HandId },
    HoverUpdate(HoverFrame),
    /// The host detached the part from `hand`, for whatever reason.
    Detached { hand: HandId },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    HoverLock { hand: HandId },
    HoverUnlock { hand: HandId },
    Attach {
        hand: HandId,
        grab: GrabType,
        flags: AttachmentFlags,
    },
    Detach { hand: HandId },
    SetGravity(bool),
    SetKinematic(bool),
    Teleport(Pose),
    SetMarkerVisible(bool),
    NotifyPlaced,
    Haptic(HapticRequest),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next: GrabSnapshot,
    pub effects: Vec<Effect>,
}

pub fn transition(state: GrabSnapshot, config: &PlacementConfig, event: &GrabEvent) -> Transition {
    let mut next = state;
    let mut effects = Vec::new();

    match event {
        GrabEvent::HoverBegin { hand } => {
            effects.push(Effect::Haptic(HapticRequest::hover_pulse(*hand)));
        }
        GrabEvent::HoverEnd { .. } => {}
        GrabEvent::HoverUpdate(frame) => hover_update(&mut next, config, frame, &mut effects),
        GrabEvent::Detached { .. } => {
            if next.phase == GrabPhase::Held {
                next.phase = GrabPhase::Free;
            }
        }
    }

    Transition { next, effects }
}

fn hover_update(
    state: &mut GrabSnapshot,
    config: &PlacementConfig,
    frame: &HoverFrame,
    effects: &mut Vec<Effect>,
) {
    let hand = frame.hand;
    sync_hold(state, frame.attached);
    // The host only reports a grab ending for a part that is attached to the hand.
    let grab_ending = frame.grab_ending && state.phase == GrabPhase::Held;

    match frame.grab_starting {
        Some(grab) if state.phase != GrabPhase::Held => {
            effects.push(Effect::HoverLock { hand });
            effects.push(Effect::Attach {
                hand,
                grab,
                flags: config.attachment_flags,
            });
            if state.phase == GrabPhase::Placed {
                effects.push(Effect::SetGravity(true));
                effects.push(Effect::SetKinematic(!config.release_kinematic_on_regrab));
            }
            state.phase = GrabPhase::Held;
        }
        _ if grab_ending => {
            effects.push(Effect::Detach { hand });
            effects.push(Effect::HoverUnlock { hand });
            match acceptable_target(config, &frame.pose) {
                Some(target) => {
                    effects.push(Effect::NotifyPlaced);
                    state.was_acceptable = true;
                    settle_onto(target, effects);
                    state.phase = GrabPhase::Placed;
                }
                None => {
                    state.was_acceptable = false;
                    state.phase = GrabPhase::Free;
                }
            }
        }
        _ => {}
    }

    if state.phase != GrabPhase::Held || grab_ending {
        return;
    }
    let Some(target) = config.target else {
        return;
    };

    if !is_acceptable(&frame.pose, &target, &config.tolerance) {
        state.was_acceptable = false;
    } else if state.was_acceptable {
        effects.push(Effect::SetMarkerVisible(true));
    } else {
        effects.push(Effect::NotifyPlaced);
        state.was_acceptable = true;
        if config.snap_and_detach {
            effects.push(Effect::Detach { hand });
            effects.push(Effect::HoverUnlock { hand });
            settle_onto(target, effects);
            state.phase = GrabPhase::Placed;
        }
    }
}

/// After this, `Held` iff the host reports the part attached.
fn sync_hold(state: &mut GrabSnapshot, attached: bool) {
    match (attached, state.phase) {
        (true, GrabPhase::Free | GrabPhase::Placed) => state.phase = GrabPhase::Held,
        (false, GrabPhase::Held) => state.phase = GrabPhase::Free,
        _ => {}
    }
}

fn acceptable_target(config: &PlacementConfig, pose: &Pose) -> Option<Pose> {
    config
        .target
        .filter(|target| is_acceptable(pose, target, &config.tolerance))
}

/// Freeze the part exactly on the target and hide the marker.
fn settle_onto(target: Pose, effects: &mut Vec<Effect>) {
    effects.extend([
        Effect::SetGravity(false),
        Effect::SetKinematic(true),
        Effect::Teleport(target),
        Effect::SetMarkerVisible(false),
    ]);
}
