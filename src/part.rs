//! Host adapter: turns engine callbacks into [`GrabEvent`]s and applies the resulting effects.

use tracing::{debug, info, instrument, trace, warn};

use crate::config::PlacementConfig;
use crate::error::ConfigError;
use crate::grab::{transition, Effect, GrabEvent, GrabPhase, GrabSnapshot, HoverFrame, Transition};
use crate::haptics::HapticDispatcher;
use crate::host::{HandHandle, MarkerHandle, PhysicsHandle, PoseHandle};

type PlacementListener = Box<dyn FnMut() + Send>;

/// A grabbable part that snaps onto its target pose.
///
/// The host calls the `on_*` / `hand_*` methods from its per-frame interaction dispatch.
pub struct PlaceablePart {
    config: PlacementConfig,
    state: GrabSnapshot,
    physics: Box<dyn PhysicsHandle>,
    pose: Box<dyn PoseHandle>,
    marker: Option<Box<dyn MarkerHandle>>,
    haptics: Option<HapticDispatcher>,
    listeners: Vec<PlacementListener>,
}

impl std::fmt::Debug for PlaceablePart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaceablePart")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("has_marker", &self.marker.is_some())
            .field("has_haptics", &self.haptics.is_some())
            .field("listeners_len", &self.listeners.len())
            .finish()
    }
}

impl PlaceablePart {
    /// Validates the config and starts the part in the free state.
    pub fn new(
        config: PlacementConfig,
        physics: Box<dyn PhysicsHandle>,
        pose: Box<dyn PoseHandle>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            state: GrabSnapshot::default(),
            physics,
            pose,
            marker: None,
            haptics: None,
            listeners: Vec::new(),
        })
    }

    pub fn with_marker(mut self, marker: Box<dyn MarkerHandle>) -> Self {
        self.marker = Some(marker);
        self
    }

    pub fn with_haptics(mut self, haptics: HapticDispatcher) -> Self {
        self.haptics = Some(haptics);
        self
    }

    /// Subscribe to acceptable placements. Listeners run in subscription order.
    pub fn on_acceptable_placement(&mut self, listener: impl FnMut() + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    pub fn phase(&self) -> GrabPhase {
        self.state.phase
    }

    pub fn was_acceptable(&self) -> bool {
        self.state.was_acceptable
    }

    #[instrument(level = "trace", skip_all, fields(hand = hand.id().0))]
    pub fn on_hand_hover_begin(&mut self, hand: &mut dyn HandHandle) {
        let event = GrabEvent::HoverBegin { hand: hand.id() };
        self.step(hand, &event);
    }

    #[instrument(level = "trace", skip_all, fields(hand = hand.id().0))]
    pub fn on_hand_hover_end(&mut self, hand: &mut dyn HandHandle) {
        let event = GrabEvent::HoverEnd { hand: hand.id() };
        self.step(hand, &event);
    }

    /// Per-frame update while `hand` hovers (or hover-locks) this part.
    #[instrument(level = "trace", skip_all, fields(hand = hand.id().0))]
    pub fn hand_hover_update(&mut self, hand: &mut dyn HandHandle) {
        let event = GrabEvent::HoverUpdate(HoverFrame {
            hand: hand.id(),
            grab_starting: hand.grab_starting(),
            grab_ending: hand.is_grab_ending(),
            attached: hand.is_part_attached(),
            pose: self.pose.pose(),
        });
        self.step(hand, &event);
    }

    pub fn on_attached_to_hand(&mut self, hand: &dyn HandHandle) {
        trace!(hand = hand.id().0, "attached to hand");
    }

    /// Covers detaches the part did not ask for: another hand taking it, lost tracking, or
    /// a host-side drop.
    #[instrument(level = "trace", skip_all, fields(hand = hand.id().0))]
    pub fn on_detached_from_hand(&mut self, hand: &mut dyn HandHandle) {
        let event = GrabEvent::Detached { hand: hand.id() };
        self.step(hand, &event);
    }

    /// Placement is evaluated from the hover update, so nothing happens here.
    pub fn hand_attached_update(&mut self, _hand: &dyn HandHandle) {}

    pub fn on_hand_focus_acquired(&mut self, hand: &dyn HandHandle) {
        trace!(hand = hand.id().0, "hand focus acquired");
    }

    pub fn on_hand_focus_lost(&mut self, hand: &dyn HandHandle) {
        trace!(hand = hand.id().0, "hand focus lost");
    }

    fn step(&mut self, hand: &mut dyn HandHandle, event: &GrabEvent) {
        if self.config.target.is_none() {
            if let GrabEvent::HoverUpdate(frame) = event {
                if frame.grab_ending && frame.attached && self.state.phase == GrabPhase::Held {
                    warn!("released a part that has no target pose; leaving it free");
                }
            }
        }

        let Transition { next, effects } = transition(self.state, &self.config, event);
        let previous = std::mem::replace(&mut self.state, next);

        for effect in effects {
            self.apply(hand, effect);
        }

        if previous.phase != next.phase {
            debug!(
                from = ?previous.phase,
                to = ?next.phase,
                gravity = self.physics.gravity(),
                kinematic = self.physics.kinematic(),
                "grab phase changed"
            );
        }
    }

    fn apply(&mut self, hand: &mut dyn HandHandle, effect: Effect) {
        match effect {
            Effect::HoverLock { .. } => hand.hover_lock(),
            Effect::HoverUnlock { .. } => hand.hover_unlock(),
            Effect::Attach { grab, flags, .. } => hand.attach(grab, flags),
            Effect::Detach { .. } => hand.detach(),
            Effect::SetGravity(enabled) => self.physics.set_gravity(enabled),
            Effect::SetKinematic(enabled) => self.physics.set_kinematic(enabled),
            Effect::Teleport(target) => self.pose.set_pose(target),
            Effect::SetMarkerVisible(visible) => {
                if let Some(marker) = self.marker.as_mut() {
                    marker.set_visible(visible);
                }
            }
            Effect::NotifyPlaced => {
                info!(listeners = self.listeners.len(), "part placed within tolerance");
                for listener in self.listeners.iter_mut() {
                    listener();
                }
            }
            Effect::Haptic(request) => match &self.haptics {
                // Not awaited.
                Some(haptics) => drop(haptics.dispatch(request)),
                None => trace!(hand = request.hand.0, "no haptic device; pulse skipped"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HapticError;
    use crate::haptics::{HapticDevice, HapticRequest};
    use crate::placement::Tolerance;
    use crate::pose::{AttachmentFlags, GrabType, HandId, Pose};
    use async_trait::async_trait;
    use nalgebra::Vector3;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default)]
    struct Body {
        gravity: bool,
        kinematic: bool,
        pose: Pose,
        marker_visible: Option<bool>,
    }

    type SharedBody = Arc<Mutex<Body>>;

    struct BodyPhysics(SharedBody);
    struct BodyPose(SharedBody);
    struct BodyMarker(SharedBody);

    impl PhysicsHandle for BodyPhysics {
        fn gravity(&self) -> bool {
            self.0.lock().unwrap().gravity
        }
        fn set_gravity(&mut self, enabled: bool) {
            self.0.lock().unwrap().gravity = enabled;
        }
        fn kinematic(&self) -> bool {
            self.0.lock().unwrap().kinematic
        }
        fn set_kinematic(&mut self, enabled: bool) {
            self.0.lock().unwrap().kinematic = enabled;
        }
    }

    impl PoseHandle for BodyPose {
        fn pose(&self) -> Pose {
            self.0.lock().unwrap().pose
        }
        fn set_pose(&mut self, pose: Pose) {
            self.0.lock().unwrap().pose = pose;
        }
    }

    impl MarkerHandle for BodyMarker {
        fn set_visible(&mut self, visible: bool) {
            self.0.lock().unwrap().marker_visible = Some(visible);
        }
    }

    #[derive(Debug, Default)]
    struct FakeHand {
        grab_starting: Option<GrabType>,
        grab_ending: bool,
        hover_locked: bool,
        attached: Option<AttachmentFlags>,
    }

    impl HandHandle for FakeHand {
        fn id(&self) -> HandId {
            HandId(0)
        }
        fn grab_starting(&self) -> Option<GrabType> {
            self.grab_starting
        }
        fn is_grab_ending(&self) -> bool {
            self.grab_ending
        }
        fn is_part_attached(&self) -> bool {
            self.attached.is_some()
        }
        fn hover_lock(&mut self) {
            self.hover_locked = true;
        }
        fn hover_unlock(&mut self) {
            self.hover_locked = false;
        }
        fn attach(&mut self, _grab: GrabType, flags: AttachmentFlags) {
            self.attached = Some(flags);
        }
        fn detach(&mut self) {
            self.attached = None;
        }
    }

    fn part(config: PlacementConfig) -> (PlaceablePart, SharedBody, Arc<AtomicUsize>) {
        let body = Arc::new(Mutex::new(Body {
            gravity: true,
            ..Body::default()
        }));
        let placed = Arc::new(AtomicUsize::new(0));

        let mut part = PlaceablePart::new(
            config,
            Box::new(BodyPhysics(Arc::clone(&body))),
            Box::new(BodyPose(Arc::clone(&body))),
        )
        .expect("valid config")
        .with_marker(Box::new(BodyMarker(Arc::clone(&body))));

        let counter = Arc::clone(&placed);
        part.on_acceptable_placement(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (part, body, placed)
    }

    fn target_config(snap_and_detach: bool) -> PlacementConfig {
        PlacementConfig {
            snap_and_detach,
            tolerance: Tolerance::new(0.1, 10.0),
            ..PlacementConfig::with_target(Pose::identity())
        }
    }

    fn grab_with(part: &mut PlaceablePart, hand: &mut FakeHand) {
        hand.grab_starting = Some(GrabType::Grip);
        part.hand_hover_update(hand);
        hand.grab_starting = None;
    }

    fn release_with(part: &mut PlaceablePart, hand: &mut FakeHand) {
        hand.grab_ending = true;
        part.hand_hover_update(hand);
        hand.grab_ending = false;
    }

    #[test]
    fn release_near_target_snaps_exactly() {
        let (mut part, body, placed) = part(target_config(true));
        let mut hand = FakeHand::default();
        body.lock().unwrap().pose = Pose::at(1.0, 0.0, 0.0);

        grab_with(&mut part, &mut hand);
        assert!(hand.hover_locked);
        assert_eq!(hand.attached, Some(AttachmentFlags::part_default()));

        // Carried close; release on the same frame it enters tolerance.
        body.lock().unwrap().pose = Pose::at(0.05, 0.0, 0.0).rotated(Vector3::y(), 5.0);
        release_with(&mut part, &mut hand);

        let body = body.lock().unwrap();
        assert_eq!(placed.load(Ordering::SeqCst), 1);
        assert_eq!(body.pose, Pose::identity());
        assert_eq!(body.marker_visible, Some(false));
        assert!(!body.gravity);
        assert!(body.kinematic);
        assert!(!hand.hover_locked);
        assert_eq!(hand.attached, None);
        assert_eq!(part.phase(), GrabPhase::Placed);
    }

    #[test]
    fn release_far_from_target_keeps_physics() {
        let (mut part, body, placed) = part(target_config(true));
        let mut hand = FakeHand::default();
        body.lock().unwrap().pose = Pose::at(1.0, 0.0, 0.0);

        grab_with(&mut part, &mut hand);
        release_with(&mut part, &mut hand);

        let body = body.lock().unwrap();
        assert_eq!(placed.load(Ordering::SeqCst), 0);
        assert_eq!(body.pose, Pose::at(1.0, 0.0, 0.0));
        assert!(body.gravity);
        assert_eq!(body.marker_visible, None);
        assert!(!part.was_acceptable());
        assert_eq!(part.phase(), GrabPhase::Free);
    }

    #[test]
    fn carrying_into_tolerance_forces_release() {
        let (mut part, body, placed) = part(target_config(true));
        let mut hand = FakeHand::default();
        body.lock().unwrap().pose = Pose::at(1.0, 0.0, 0.0);
        grab_with(&mut part, &mut hand);

        body.lock().unwrap().pose = Pose::at(0.0, 0.08, 0.0);
        part.hand_hover_update(&mut hand);

        assert_eq!(placed.load(Ordering::SeqCst), 1);
        assert_eq!(hand.attached, None);
        assert_eq!(body.lock().unwrap().pose, Pose::identity());
        assert_eq!(part.phase(), GrabPhase::Placed);

        // Grip released later: the part is no longer held, so nothing else happens.
        release_with(&mut part, &mut hand);
        assert_eq!(placed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn regrab_from_placed_restores_physics() {
        let (mut part, body, _placed) = part(target_config(false));
        let mut hand = FakeHand::default();
        body.lock().unwrap().pose = Pose::at(0.02, 0.0, 0.0);
        grab_with(&mut part, &mut hand);
        release_with(&mut part, &mut hand);
        assert_eq!(part.phase(), GrabPhase::Placed);

        grab_with(&mut part, &mut hand);

        let body = body.lock().unwrap();
        assert!(body.gravity);
        assert!(body.kinematic);
        assert_eq!(part.phase(), GrabPhase::Held);
        // Still sitting on the target: the marker comes back as a "let go" hint.
        assert_eq!(body.marker_visible, Some(true));
    }

    #[test]
    fn host_detach_allows_another_hand_to_grab() {
        let (mut part, body, _placed) = part(target_config(true));
        let mut first = FakeHand::default();
        let mut second = FakeHand::default();
        body.lock().unwrap().pose = Pose::at(1.0, 0.0, 0.0);
        grab_with(&mut part, &mut first);
        assert_eq!(part.phase(), GrabPhase::Held);

        first.detach();
        part.on_detached_from_hand(&mut first);
        assert_eq!(part.phase(), GrabPhase::Free);

        grab_with(&mut part, &mut second);
        assert_eq!(second.attached, Some(AttachmentFlags::part_default()));
        assert!(second.hover_locked);
        assert_eq!(part.phase(), GrabPhase::Held);
    }

    #[test]
    fn silent_host_detach_is_picked_up_on_next_hover_update() {
        let (mut part, body, placed) = part(target_config(true));
        let mut hand = FakeHand::default();
        body.lock().unwrap().pose = Pose::at(1.0, 0.0, 0.0);
        grab_with(&mut part, &mut hand);

        // Dropped without a detach callback; the part then falls into tolerance.
        hand.attached = None;
        body.lock().unwrap().pose = Pose::at(0.0, 0.05, 0.0);
        part.hand_hover_update(&mut hand);

        assert_eq!(part.phase(), GrabPhase::Free);
        assert_eq!(placed.load(Ordering::SeqCst), 0);
        assert_eq!(body.lock().unwrap().pose, Pose::at(0.0, 0.05, 0.0));

        grab_with(&mut part, &mut hand);
        assert!(hand.attached.is_some());
        assert_eq!(part.phase(), GrabPhase::Held);
    }

    #[test]
    fn invalid_tolerance_is_rejected_at_construction() {
        let body: SharedBody = Arc::default();
        let config = PlacementConfig {
            tolerance: Tolerance::new(f32::INFINITY, 10.0),
            ..PlacementConfig::default()
        };

        let result = PlaceablePart::new(
            config,
            Box::new(BodyPhysics(Arc::clone(&body))),
            Box::new(BodyPose(body)),
        );
        assert!(matches!(result, Err(ConfigError::InvalidTolerance { .. })));
    }

    struct CountingDevice(Arc<AtomicUsize>);

    #[async_trait]
    impl HapticDevice for CountingDevice {
        async fn pulse(&self, request: HapticRequest) -> Result<(), HapticError> {
            assert_eq!(request, HapticRequest::hover_pulse(HandId(0)));
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn hover_begin_pulses_the_hand() {
        let pulses = Arc::new(AtomicUsize::new(0));
        let dispatcher =
            HapticDispatcher::on_current_runtime(Arc::new(CountingDevice(Arc::clone(&pulses))));
        let (part, _body, _placed) = part(target_config(true));
        let mut part = part.with_haptics(dispatcher);
        let mut hand = FakeHand::default();

        part.on_hand_hover_begin(&mut hand);
        part.on_hand_hover_end(&mut hand);

        for _ in 0..100 {
            if pulses.load(Ordering::SeqCst) > 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(pulses.load(Ordering::SeqCst), 1);
        assert_eq!(part.phase(), GrabPhase::Free);
    }
}
