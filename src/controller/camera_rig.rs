//! Camera rig: keeps the camera attached to the character in one of two
//! modes. In orbit mode an external control owns the camera rotation and the
//! rig only translates; in follow mode the rig owns both and strafing swings
//! the character around a pivot anchored at the camera.

use glam::{Quat, Vec3};

use super::direction::{self, GROUND_NORMAL};
use super::movement::{LateralMotion, LinearStrafe, StepOutcome};
use super::orbit::OrbitControl;
use crate::model::{Camera, CharacterTransform};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMode {
    Orbit,
    Follow,
}

/// Which component writes the camera rotation this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationOwner {
    Rig,
    OrbitControl,
}

impl CameraMode {
    pub fn rotation_owner(self) -> RotationOwner {
        match self {
            CameraMode::Orbit => RotationOwner::OrbitControl,
            CameraMode::Follow => RotationOwner::Rig,
        }
    }
}

/// Non-rendered node at the camera position carrying an offset to the
/// character. Turning it about the up axis swings the character around the
/// camera.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackPivot {
    pub position: Vec3,
    pub rotation: Quat,
    pub child_offset: Vec3,
    pending: Option<Quat>,
}

const MIN_RADIUS: f32 = 1e-4;

impl TrackPivot {
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            child_offset: Vec3::ZERO,
            pending: None,
        }
    }

    pub fn anchor(&mut self, camera_position: Vec3, character_position: Vec3) {
        self.position = camera_position;
        self.rotation = Quat::IDENTITY;
        self.child_offset = character_position - camera_position;
        self.pending = None;
    }

    /// World position of the carried child.
    pub fn child_world(&self) -> Vec3 {
        self.position + self.rotation * self.child_offset
    }

    fn ground_radius(&self) -> f32 {
        direction::project_on_ground(self.rotation * self.child_offset).length()
    }
}

impl Default for TrackPivot {
    fn default() -> Self {
        Self::new()
    }
}

impl LateralMotion for TrackPivot {
    fn propose(&mut self, origin: Vec3, side: Vec3, distance: f32) -> Vec3 {
        let radius = self.ground_radius();
        if radius < MIN_RADIUS {
            self.pending = None;
            return side * distance;
        }
        // positive angles turn counter-clockwise about up, the same way `side` points
        let turn = Quat::from_axis_angle(GROUND_NORMAL, distance / radius);
        let rotation = (turn * self.rotation).normalize();
        self.pending = Some(rotation);
        self.position + rotation * self.child_offset - origin
    }

    fn commit(&mut self) {
        if let Some(rotation) = self.pending.take() {
            self.rotation = rotation;
        }
    }

    fn discard(&mut self) {
        self.pending = None;
    }

    fn carry(&mut self, offset: Vec3) {
        self.position += offset;
    }
}

/// Two-mode camera state machine.
#[derive(Debug, Clone)]
pub struct CameraRig {
    mode: Option<CameraMode>,
    pivot: TrackPivot,
    linear: LinearStrafe,
    warned_missing_control: bool,
}

/// Drift between the pivot child and the character beyond which the pivot is
/// re-anchored (the character was moved by someone else).
const ANCHOR_TOLERANCE: f32 = 1e-3;

impl CameraRig {
    pub fn new() -> Self {
        Self {
            mode: None,
            pivot: TrackPivot::new(),
            linear: LinearStrafe,
            warned_missing_control: false,
        }
    }

    /// Mode of the last tick, `None` before the first one.
    pub fn mode(&self) -> Option<CameraMode> {
        self.mode
    }

    pub fn rotation_owner(&self) -> Option<RotationOwner> {
        self.mode.map(CameraMode::rotation_owner)
    }

    pub fn pivot(&self) -> &TrackPivot {
        &self.pivot
    }

    /// Forget the current anchoring; the next tick starts as a fresh transition.
    pub fn invalidate(&mut self) {
        tracing::debug!("camera rig invalidated");
        self.mode = None;
    }

    /// Orbit needs both the flag and an attached control; anything else
    /// falls back to follow.
    pub fn resolve_mode(&mut self, orbit_requested: bool, has_control: bool) -> CameraMode {
        if !orbit_requested {
            self.warned_missing_control = false;
            return CameraMode::Follow;
        }
        if has_control {
            self.warned_missing_control = false;
            return CameraMode::Orbit;
        }
        if !self.warned_missing_control {
            tracing::warn!("orbit mode requested without an orbit control, following instead");
            self.warned_missing_control = true;
        }
        CameraMode::Follow
    }

    /// Settle the mode for this tick and re-anchor on a transition. Runs before
    /// the character moves.
    pub fn begin_tick(
        &mut self,
        orbit_requested: bool,
        camera: &Camera,
        character: &CharacterTransform,
        orbit: Option<&mut dyn OrbitControl>,
    ) -> CameraMode {
        let mode = self.resolve_mode(orbit_requested, orbit.is_some());

        if self.mode != Some(mode) {
            let offset = direction::project_on_ground(character.position - camera.position);
            tracing::debug!(from = ?self.mode, to = ?mode, ?offset, "camera mode transition");
            if mode == CameraMode::Follow {
                self.pivot.anchor(camera.position, character.position);
            }
            self.mode = Some(mode);
        } else if mode == CameraMode::Follow {
            self.pivot.position = camera.position;
            if self.pivot.child_world().distance(character.position) > ANCHOR_TOLERANCE {
                tracing::debug!("character moved outside the rig, re-anchoring pivot");
                self.pivot.anchor(camera.position, character.position);
            }
        }

        if let Some(control) = orbit {
            let enabled = mode == CameraMode::Orbit;
            if control.enabled() != enabled {
                control.set_enabled(enabled);
            }
            if enabled {
                control.set_target(character.position);
            }
        }
        mode
    }

    /// Strafe implementation for `mode`.
    pub fn lateral_motion(&mut self, mode: CameraMode) -> &mut dyn LateralMotion {
        match mode {
            CameraMode::Orbit => &mut self.linear,
            CameraMode::Follow => &mut self.pivot,
        }
    }

    /// Bring the camera up to date with the character after it moved.
    pub fn sync(
        &mut self,
        mode: CameraMode,
        outcome: &StepOutcome,
        camera: &mut Camera,
        character: &CharacterTransform,
        orbit: Option<&mut dyn OrbitControl>,
        dt: f32,
    ) {
        match (mode, orbit) {
            (CameraMode::Orbit, Some(control)) => {
                // translation is ours, rotation is the control's
                let previous = camera.rotation;
                camera.rotation = Quat::IDENTITY;
                camera.position += outcome.committed_offset();
                control.set_target(character.position);
                if !control.update(camera, dt) {
                    camera.rotation = previous;
                }
            }
            _ => {
                if let Some(offset) = outcome.longitudinal.committed() {
                    camera.position += offset;
                }
                camera.look_at(character.position);
            }
        }
    }
}

impl Default for CameraRig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::collision::CollisionGuard;
    use crate::controller::movement::{FacingPolicy, MovementIntegrator};
    use crate::controller::orbit::OrbitControls;
    use crate::model::{Aabb, Intents};

    fn setup() -> (Camera, CharacterTransform) {
        let mut camera = Camera::new(800, 600);
        camera.position = Vec3::new(0.0, 2.0, 10.0);
        let character = CharacterTransform::new(
            Vec3::new(0.0, 0.0, 5.0),
            Aabb::new(Vec3::new(-0.2, 0.0, -0.2), Vec3::new(0.2, 0.9, 0.2)),
        );
        camera.look_at(character.position);
        (camera, character)
    }

    fn run_tick(
        rig: &mut CameraRig,
        integrator: &mut MovementIntegrator,
        intents: Intents,
        orbit_requested: bool,
        camera: &mut Camera,
        character: &mut CharacterTransform,
        mut orbit: Option<&mut OrbitControls>,
        dt: f32,
    ) -> StepOutcome {
        let mode = rig.begin_tick(
            orbit_requested,
            camera,
            character,
            orbit.as_mut().map(|o| &mut **o as &mut dyn OrbitControl),
        );
        let dirs = direction::resolve(camera);
        let guard = CollisionGuard::new(None);
        let outcome = integrator.step(dt, intents, &dirs, character, &guard, rig.lateral_motion(mode));
        rig.sync(mode, &outcome, camera, character, orbit.map(|o| o as &mut dyn OrbitControl), dt);
        outcome
    }

    #[test]
    fn test_follow_forward_moves_camera_with_character() {
        let (mut camera, mut character) = setup();
        let mut rig = CameraRig::new();
        let mut integrator = MovementIntegrator::new(1.0, FacingPolicy::Snap);
        let intents = Intents { forward: true, ..Intents::default() };
        let cam_start = camera.position;
        let char_start = character.position;
        run_tick(&mut rig, &mut integrator, intents, false, &mut camera, &mut character, None, 0.5);

        let moved = character.position - char_start;
        assert!((moved.length() - 0.5).abs() < 1e-4);
        assert!((camera.position - cam_start).abs_diff_eq(moved, 1e-5));
        let aim = (character.position - camera.position).normalize();
        assert!(camera.forward().abs_diff_eq(aim, 1e-4));
        assert_eq!(rig.rotation_owner(), Some(RotationOwner::Rig));
    }

    #[test]
    fn test_follow_strafe_swings_around_camera() {
        let (mut camera, mut character) = setup();
        let mut rig = CameraRig::new();
        let mut integrator = MovementIntegrator::new(1.0, FacingPolicy::Snap);
        let intents = Intents { left: true, ..Intents::default() };
        let radius = direction::project_on_ground(character.position - camera.position).length();
        let cam_start = camera.position;

        let mut travelled = 0.0;
        for _ in 0..10 {
            let before = character.position;
            run_tick(&mut rig, &mut integrator, intents, false, &mut camera, &mut character, None, 0.1);
            travelled += character.position.distance(before);
        }
        assert_eq!(camera.position, cam_start, "strafing does not translate the camera");
        let now = direction::project_on_ground(character.position - camera.position).length();
        assert!((now - radius).abs() < 1e-3, "radius {radius} became {now}");
        assert!(character.position.x < -0.5, "left is -X here, got {:?}", character.position);
        // chord lengths of a 1.0 arc
        assert!((travelled - 1.0).abs() < 1e-3, "travelled {travelled}");
        assert!(rig.pivot().child_world().abs_diff_eq(character.position, 1e-4));
    }

    #[test]
    fn test_orbit_mode_translates_and_hands_rotation_to_control() {
        let (mut camera, mut character) = setup();
        let mut rig = CameraRig::new();
        let mut integrator = MovementIntegrator::new(1.0, FacingPolicy::Snap);
        let mut controls = OrbitControls::new();
        let intents = Intents { right: true, ..Intents::default() };
        let cam_start = camera.position;

        let outcome = run_tick(&mut rig, &mut integrator, intents, true, &mut camera, &mut character, Some(&mut controls), 0.5);

        assert_eq!(rig.mode(), Some(CameraMode::Orbit));
        assert_eq!(rig.rotation_owner(), Some(RotationOwner::OrbitControl));
        assert!(outcome.lateral.committed().is_some());
        assert!((camera.position - cam_start).abs_diff_eq(outcome.committed_offset(), 1e-4));
        assert!(controls.target().abs_diff_eq(character.position, 1e-6));
        let aim = (character.position - camera.position).normalize();
        assert!(camera.forward().abs_diff_eq(aim, 1e-4));
    }

    #[test]
    fn test_orbit_keeps_rotation_when_camera_sits_on_target() {
        let (mut camera, mut character) = setup();
        let mut rig = CameraRig::new();
        let mut integrator = MovementIntegrator::new(1.0, FacingPolicy::Snap);
        let mut controls = OrbitControls::new();
        let rotation = camera.rotation;
        camera.position = character.position;

        run_tick(&mut rig, &mut integrator, Intents::default(), true, &mut camera, &mut character, Some(&mut controls), 0.1);

        assert_eq!(rig.mode(), Some(CameraMode::Orbit));
        assert_eq!(camera.rotation, rotation);
        assert_eq!(camera.position, character.position);
    }

    #[test]
    fn test_missing_control_falls_back_to_follow() {
        let (mut camera, mut character) = setup();
        let mut rig = CameraRig::new();
        let mut integrator = MovementIntegrator::new(1.0, FacingPolicy::Snap);
        for _ in 0..3 {
            run_tick(&mut rig, &mut integrator, Intents::default(), true, &mut camera, &mut character, None, 0.1);
            assert_eq!(rig.mode(), Some(CameraMode::Follow));
        }
    }

    #[test]
    fn test_follow_disables_attached_control() {
        let (mut camera, mut character) = setup();
        let mut rig = CameraRig::new();
        let mut integrator = MovementIntegrator::new(1.0, FacingPolicy::Snap);
        let mut controls = OrbitControls::new();

        run_tick(&mut rig, &mut integrator, Intents::default(), true, &mut camera, &mut character, Some(&mut controls), 0.1);
        assert!(controls.enabled());
        run_tick(&mut rig, &mut integrator, Intents::default(), false, &mut camera, &mut character, Some(&mut controls), 0.1);
        assert!(!controls.enabled(), "only one writer of camera rotation per tick");
        assert_eq!(rig.rotation_owner(), Some(RotationOwner::Rig));
    }

    #[test]
    fn test_mode_switch_does_not_jump_character() {
        let (mut camera, mut character) = setup();
        let mut rig = CameraRig::new();
        let mut integrator = MovementIntegrator::new(1.0, FacingPolicy::Snap);
        let mut controls = OrbitControls::new();
        let intents = Intents { forward: true, left: true, ..Intents::default() };
        let dt = 0.1;
        // diagonal step bound
        let max_step = 2f32.sqrt() * dt + 1e-4;

        let mut requested = true;
        for tick in 0..12 {
            if tick % 3 == 0 {
                requested = !requested;
            }
            let before = character.position;
            run_tick(&mut rig, &mut integrator, intents, requested, &mut camera, &mut character, Some(&mut controls), dt);
            let jump = character.position.distance(before);
            assert!(jump <= max_step, "tick {tick}: moved {jump}");
            assert!(rig.pivot().child_world().distance(character.position) < 1e-3 || rig.mode() == Some(CameraMode::Orbit));
        }
    }

    #[test]
    fn test_external_teleport_reanchors() {
        let (mut camera, mut character) = setup();
        let mut rig = CameraRig::new();
        let mut integrator = MovementIntegrator::new(1.0, FacingPolicy::Snap);
        run_tick(&mut rig, &mut integrator, Intents::default(), false, &mut camera, &mut character, None, 0.1);
        character.position = Vec3::new(3.0, 0.0, 4.0);
        run_tick(&mut rig, &mut integrator, Intents::default(), false, &mut camera, &mut character, None, 0.1);
        assert!(rig.pivot().child_world().abs_diff_eq(character.position, 1e-5));
    }
}
