//! Spatial and hand primitives shared by the placement checker and the state machine.
//!
//! Positions and orientations are plain [`nalgebra`] types so hosts can convert from their
//! own transform representation without an intermediate math layer.

use std::ops::{BitAnd, BitOr, Not};

use nalgebra::{Point3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// A rigid pose: world-space position plus orientation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Point3<f32>,
    pub orientation: UnitQuaternion<f32>,
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose {
    pub fn new(position: Point3<f32>, orientation: UnitQuaternion<f32>) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Origin with no rotation.
    pub fn identity() -> Self {
        Self::new(Point3::origin(), UnitQuaternion::identity())
    }

    /// Convenience constructor from a translation with identity orientation.
    pub fn at(x: f32, y: f32, z: f32) -> Self {
        Self::new(Point3::new(x, y, z), UnitQuaternion::identity())
    }

    /// Returns a copy rotated by `degrees` about `axis` (applied after the current orientation).
    pub fn rotated(self, axis: Vector3<f32>, degrees: f32) -> Self {
        let rotation = match nalgebra::Unit::try_new(axis, f32::EPSILON) {
            Some(axis) => UnitQuaternion::from_axis_angle(&axis, degrees.to_radians()),
            None => UnitQuaternion::identity(),
        };
        Self::new(self.position, rotation * self.orientation)
    }
}

/// Host-assigned hand identifier (e.g. 0 = left, 1 = right).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandId(pub usize);

/// The kind of grab gesture a hand is performing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrabType {
    Pinch,
    Grip,
}

/// How the host binds an attached object to a hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentFlags(u32);

impl AttachmentFlags {
    /// Move the object so its attachment point lines up with the hand.
    pub const SNAP_ON_ATTACH: Self = Self(1 << 0);
    /// Detach other objects held by the same hand.
    pub const DETACH_OTHERS: Self = Self(1 << 1);
    /// Take the object away from the other hand if it is holding it.
    pub const DETACH_FROM_OTHER_HAND: Self = Self(1 << 2);
    /// Parent the object's transform to the hand.
    pub const PARENT_TO_HAND: Self = Self(1 << 3);
    /// Follow the hand through velocities instead of direct transform writes.
    pub const VELOCITY_MOVEMENT: Self = Self(1 << 4);
    pub const TURN_ON_KINEMATIC: Self = Self(1 << 5);
    pub const TURN_OFF_GRAVITY: Self = Self(1 << 6);
    pub const ALLOW_SIDEWAYS: Self = Self(1 << 7);

    pub const fn empty() -> Self {
        Self(0)
    }

    /// The host's default attachment behavior.
    pub const fn host_default() -> Self {
        Self(
            Self::PARENT_TO_HAND.0
                | Self::DETACH_OTHERS.0
                | Self::DETACH_FROM_OTHER_HAND.0
                | Self::TURN_ON_KINEMATIC.0
                | Self::SNAP_ON_ATTACH.0,
        )
    }

    /// Host default without snapping, detaching others, or velocity following.
    ///
    /// A part keeps its grab offset so the user can line it up with its target by hand.
    pub const fn part_default() -> Self {
        Self::host_default()
            .without(Self::SNAP_ON_ATTACH)
            .without(Self::DETACH_OTHERS)
            .without(Self::VELOCITY_MOVEMENT)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

impl Default for AttachmentFlags {
    fn default() -> Self {
        Self::part_default()
    }
}

impl BitOr for AttachmentFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitAnd for AttachmentFlags {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for AttachmentFlags {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0)
    }
}
