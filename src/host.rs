//! Capabilities the host engine lends to a part.
//!
//! The core never touches engine state directly: physics flags, the part's transform, the
//! target marker and the interacting hand are all reached through these traits.

use crate::pose::{AttachmentFlags, GrabType, HandId, Pose};

/// Rigid-body flags of the part.
pub trait PhysicsHandle {
    fn gravity(&self) -> bool;
    fn set_gravity(&mut self, enabled: bool);
    fn kinematic(&self) -> bool;
    fn set_kinematic(&mut self, enabled: bool);
}

/// World transform of the part.
pub trait PoseHandle {
    fn pose(&self) -> Pose;
    fn set_pose(&mut self, pose: Pose);
}

/// The "still needs placing" indicator at the target pose.
pub trait MarkerHandle {
    fn set_visible(&mut self, visible: bool);
}

/// A tracked hand, as seen from the part it is hovering.
pub trait HandHandle {
    fn id(&self) -> HandId;

    /// Grab gesture starting this frame, if any.
    fn grab_starting(&self) -> Option<GrabType>;

    /// Whether the grab holding this part is ending this frame.
    fn is_grab_ending(&self) -> bool;

    /// Whether the host currently has this part attached to a hand (any hand).
    fn is_part_attached(&self) -> bool;

    /// Keep hover focus on this part and keep delivering hover updates for it.
    fn hover_lock(&mut self);
    fn hover_unlock(&mut self);

    fn attach(&mut self, grab: GrabType, flags: AttachmentFlags);
    fn detach(&mut self);
}
