use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::collision::CollisionGuard;
use super::direction::Directions;
use crate::config::ControllerConfig;
use crate::model::{CharacterTransform, Intents};

/// How the character turns towards the direction it moved in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum FacingPolicy {
    /// Face the movement target immediately.
    #[default]
    Snap,
    /// Blend towards the target by an amount accumulated over elapsed time
    /// (`turn_rate` per second); the accumulator resets after a full blend.
    Smooth { turn_rate: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AxisStep {
    Idle,
    Committed(Vec3),
    /// The candidate displacement that was rejected.
    Blocked(Vec3),
}

impl AxisStep {
    pub fn committed(&self) -> Option<Vec3> {
        match self {
            AxisStep::Committed(offset) => Some(*offset),
            _ => None,
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, AxisStep::Blocked(_))
    }
}

/// Result of one integration step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    /// Forward/back axis.
    pub longitudinal: AxisStep,
    /// Left/right axis.
    pub lateral: AxisStep,
    /// Point the character was turned towards, if it moved.
    pub facing_target: Option<Vec3>,
}

impl StepOutcome {
    pub const IDLE: Self = Self {
        longitudinal: AxisStep::Idle,
        lateral: AxisStep::Idle,
        facing_target: None,
    };

    pub fn moved(&self) -> bool {
        self.longitudinal.committed().is_some() || self.lateral.committed().is_some()
    }

    /// Sum of the committed displacements.
    pub fn committed_offset(&self) -> Vec3 {
        self.longitudinal.committed().unwrap_or(Vec3::ZERO)
            + self.lateral.committed().unwrap_or(Vec3::ZERO)
    }
}

/// Produces the strafe displacement. The camera rig swaps implementations per
/// mode: a straight line in orbit mode, an arc around a pivot in follow mode.
pub trait LateralMotion {
    /// Candidate displacement for a strafe of signed `distance` (positive is
    /// towards `side`, i.e. left) starting at `origin`. `side` is unit length.
    fn propose(&mut self, origin: Vec3, side: Vec3, distance: f32) -> Vec3;

    /// The last proposal was applied to the character.
    fn commit(&mut self) {}

    /// The last proposal was rejected.
    fn discard(&mut self) {}

    /// The character was moved by `offset` along the forward axis earlier in
    /// this tick.
    fn carry(&mut self, _offset: Vec3) {}
}

/// Straight-line strafing.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearStrafe;

impl LateralMotion for LinearStrafe {
    fn propose(&mut self, _origin: Vec3, side: Vec3, distance: f32) -> Vec3 {
        side * distance
    }
}

/// Turns held intents and elapsed time into committed, collision-checked
/// movement.
#[derive(Debug, Clone)]
pub struct MovementIntegrator {
    speed: f32,
    facing: FacingPolicy,
    turn_progress: f32,
}

impl MovementIntegrator {
    pub fn new(speed: f32, facing: FacingPolicy) -> Self {
        Self {
            speed,
            facing,
            turn_progress: 0.0,
        }
    }

    pub fn from_config(config: &ControllerConfig) -> Self {
        Self::new(config.movement_speed, config.facing)
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn facing(&self) -> FacingPolicy {
        self.facing
    }

    /// Advance the character by `dt` seconds.
    ///
    /// Each axis is gated on its own: a blocked forward move does not stop a
    /// strafe in the same tick. The second axis is probed from wherever the
    /// first one left the character.
    pub fn step(
        &mut self,
        dt: f32,
        intents: Intents,
        directions: &Directions,
        character: &mut CharacterTransform,
        guard: &CollisionGuard<'_>,
        lateral: &mut dyn LateralMotion,
    ) -> StepOutcome {
        if !(dt.is_finite() && dt > 0.0) {
            if dt != 0.0 {
                tracing::trace!(dt, "ignoring unusable tick delta");
            }
            return StepOutcome::IDLE;
        }
        let distance = self.speed * dt;
        let mut heading = Vec3::ZERO;

        let longitudinal = match (directions.forward.normalize_or_zero(), intents.longitudinal()) {
            (forward, sign) if sign != 0.0 && forward != Vec3::ZERO => {
                let dir = forward * sign;
                let candidate = dir * distance;
                if guard.is_blocked(&character.bounding_box(), candidate) {
                    AxisStep::Blocked(candidate)
                } else {
                    character.position += candidate;
                    lateral.carry(candidate);
                    heading += dir;
                    AxisStep::Committed(candidate)
                }
            }
            _ => AxisStep::Idle,
        };

        let lateral_step = match (directions.side.normalize_or_zero(), intents.lateral()) {
            (side, sign) if sign != 0.0 && side != Vec3::ZERO => {
                let candidate = lateral.propose(character.position, side, distance * sign);
                if guard.is_blocked(&character.bounding_box(), candidate) {
                    lateral.discard();
                    AxisStep::Blocked(candidate)
                } else {
                    character.position += candidate;
                    lateral.commit();
                    heading += side * sign;
                    AxisStep::Committed(candidate)
                }
            }
            _ => AxisStep::Idle,
        };

        let facing_target = (heading != Vec3::ZERO).then(|| character.position + heading);
        if let Some(target) = facing_target {
            self.turn_towards(character, target, dt);
        }

        let outcome = StepOutcome {
            longitudinal,
            lateral: lateral_step,
            facing_target,
        };
        tracing::trace!(?outcome, position = ?character.position, "movement step");
        outcome
    }

    fn turn_towards(&mut self, character: &mut CharacterTransform, target: Vec3, dt: f32) {
        match self.facing {
            FacingPolicy::Snap => {
                character.face_towards(target);
            }
            FacingPolicy::Smooth { turn_rate } => {
                let Some(goal) = character.rotation_towards(target) else {
                    return;
                };
                self.turn_progress += dt * turn_rate;
                let t = self.turn_progress.min(1.0);
                character.rotation = character.rotation.slerp(goal, t).normalize();
                if self.turn_progress >= 1.0 {
                    self.turn_progress = 0.0;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::direction;
    use crate::controller::volumes::BoundingVolume;
    use crate::model::{Aabb, Camera};
    use glam::Quat;

    fn character_at(position: Vec3) -> CharacterTransform {
        CharacterTransform::new(
            position,
            Aabb::new(Vec3::new(-0.25, 0.0, -0.25), Vec3::new(0.25, 1.0, 0.25)),
        )
    }

    fn level_camera() -> Camera {
        Camera::new(800, 600)
    }

    fn forward_only() -> Intents {
        Intents { forward: true, ..Intents::default() }
    }

    fn volume(min: Vec3, max: Vec3) -> BoundingVolume {
        BoundingVolume {
            source: "test".to_string(),
            bounds: Aabb::new(min, max),
        }
    }

    #[test]
    fn test_forward_half_second() {
        let mut integrator = MovementIntegrator::new(1.0, FacingPolicy::Snap);
        let mut c = character_at(Vec3::ZERO);
        let dirs = direction::resolve(&level_camera());
        let out = integrator.step(0.5, forward_only(), &dirs, &mut c, &CollisionGuard::new(None), &mut LinearStrafe);
        assert!(c.position.abs_diff_eq(Vec3::new(0.0, 0.0, -0.5), 1e-6), "got {:?}", c.position);
        let committed = out.longitudinal.committed().unwrap();
        assert!(committed.abs_diff_eq(Vec3::new(0.0, 0.0, -0.5), 1e-6));
        assert!(c.facing().abs_diff_eq(Vec3::NEG_Z, 1e-5));
    }

    #[test]
    fn test_displacement_is_speed_times_delta_for_any_heading() {
        let intents_list = [
            forward_only(),
            Intents { back: true, ..Intents::default() },
            Intents { left: true, ..Intents::default() },
            Intents { right: true, ..Intents::default() },
        ];
        for yaw_deg in [0.0f32, 37.0, 90.0, 200.0] {
            for pitch in [0.0f32, -0.3, -1.2] {
                let mut cam = level_camera();
                cam.rotation = Quat::from_rotation_y(yaw_deg.to_radians()) * Quat::from_rotation_x(pitch);
                let dirs = direction::resolve(&cam);
                for intents in intents_list {
                    for dt in [0.0f32, 0.016, 0.1, 0.5, 2.0] {
                        let mut integrator = MovementIntegrator::new(1.5, FacingPolicy::Snap);
                        let mut c = character_at(Vec3::new(3.0, 0.0, 1.0));
                        let start = c.position;
                        integrator.step(dt, intents, &dirs, &mut c, &CollisionGuard::new(None), &mut LinearStrafe);
                        let moved = (c.position - start).length();
                        assert!((moved - 1.5 * dt).abs() < 1e-4, "yaw {yaw_deg} pitch {pitch} dt {dt}: moved {moved}");
                        assert!((c.position.y - start.y).abs() < 1e-6, "movement stays on the ground plane");
                    }
                }
            }
        }
    }

    #[test]
    fn test_zero_and_invalid_delta_are_noops() {
        let mut integrator = MovementIntegrator::new(1.0, FacingPolicy::Snap);
        let dirs = direction::resolve(&level_camera());
        for dt in [0.0, -0.5, f32::NAN, f32::INFINITY] {
            let mut c = character_at(Vec3::ZERO).with_rotation(Quat::from_rotation_y(1.0));
            let before = c.clone();
            let out = integrator.step(dt, forward_only(), &dirs, &mut c, &CollisionGuard::new(None), &mut LinearStrafe);
            assert_eq!(out, StepOutcome::IDLE);
            assert_eq!(c.position, before.position);
            assert_eq!(c.rotation, before.rotation);
        }
    }

    #[test]
    fn test_blocked_axis_keeps_position_and_facing() {
        let mut integrator = MovementIntegrator::new(1.0, FacingPolicy::Snap);
        let dirs = direction::resolve(&level_camera());
        // box sitting exactly where the character would end up
        let volumes = vec![volume(Vec3::new(-0.25, 0.0, -0.75), Vec3::new(0.25, 1.0, -0.25))];
        let guard = CollisionGuard::new(Some(volumes.as_slice()));
        let initial = Quat::from_rotation_y(0.7);
        let mut c = character_at(Vec3::ZERO).with_rotation(initial);
        for _ in 0..3 {
            let out = integrator.step(0.5, forward_only(), &dirs, &mut c, &guard, &mut LinearStrafe);
            assert!(out.longitudinal.is_blocked());
            assert!(!out.moved());
            assert_eq!(out.facing_target, None);
        }
        assert_eq!(c.position, Vec3::ZERO);
        assert_eq!(c.rotation, initial, "a rejected move does not turn the character");
    }

    #[test]
    fn test_blocked_forward_still_strafes() {
        let mut integrator = MovementIntegrator::new(1.0, FacingPolicy::Snap);
        let dirs = direction::resolve(&level_camera());
        let volumes = vec![volume(Vec3::new(-0.2, 0.0, -1.0), Vec3::new(0.2, 1.0, -0.4))];
        let guard = CollisionGuard::new(Some(volumes.as_slice()));
        let mut c = character_at(Vec3::ZERO);
        let intents = Intents { forward: true, left: true, ..Intents::default() };
        let out = integrator.step(0.5, intents, &dirs, &mut c, &guard, &mut LinearStrafe);
        assert!(out.longitudinal.is_blocked());
        let strafe = out.lateral.committed().expect("strafe should commit");
        assert!(strafe.abs_diff_eq(Vec3::new(-0.5, 0.0, 0.0), 1e-6));
        assert!(c.position.abs_diff_eq(Vec3::new(-0.5, 0.0, 0.0), 1e-6));
        assert!(c.facing().abs_diff_eq(Vec3::NEG_X, 1e-5), "faces the committed strafe only");
    }

    #[test]
    fn test_blocked_strafe_still_moves_forward() {
        let mut integrator = MovementIntegrator::new(1.0, FacingPolicy::Snap);
        let dirs = direction::resolve(&level_camera());
        let volumes = vec![volume(Vec3::new(0.3, 0.0, -3.0), Vec3::new(0.6, 1.0, 3.0))];
        let guard = CollisionGuard::new(Some(volumes.as_slice()));
        let mut c = character_at(Vec3::ZERO);
        let intents = Intents { forward: true, right: true, ..Intents::default() };
        let out = integrator.step(0.25, intents, &dirs, &mut c, &guard, &mut LinearStrafe);
        assert!(out.lateral.is_blocked());
        assert!(c.position.abs_diff_eq(Vec3::new(0.0, 0.0, -0.25), 1e-6));
    }

    #[test]
    fn test_diagonal_moves_both_axes() {
        let mut integrator = MovementIntegrator::new(1.0, FacingPolicy::Snap);
        let dirs = direction::resolve(&level_camera());
        let mut c = character_at(Vec3::ZERO);
        let intents = Intents { forward: true, right: true, ..Intents::default() };
        let out = integrator.step(1.0, intents, &dirs, &mut c, &CollisionGuard::new(None), &mut LinearStrafe);
        assert!(c.position.abs_diff_eq(Vec3::new(1.0, 0.0, -1.0), 1e-6));
        assert!(out.committed_offset().abs_diff_eq(Vec3::new(1.0, 0.0, -1.0), 1e-6));
        let expected = Vec3::new(1.0, 0.0, -1.0).normalize();
        assert!(c.facing().abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn test_opposite_intents_cancel() {
        let mut integrator = MovementIntegrator::new(1.0, FacingPolicy::Snap);
        let dirs = direction::resolve(&level_camera());
        let mut c = character_at(Vec3::ZERO);
        let intents = Intents { forward: true, back: true, left: true, right: true };
        let out = integrator.step(1.0, intents, &dirs, &mut c, &CollisionGuard::new(None), &mut LinearStrafe);
        assert_eq!(out, StepOutcome::IDLE);
    }

    #[test]
    fn test_smooth_facing_turns_gradually() {
        let mut integrator = MovementIntegrator::new(1.0, FacingPolicy::Smooth { turn_rate: 2.0 });
        let dirs = direction::resolve(&level_camera());
        // facing +Z, asked to walk towards -Z
        let mut c = character_at(Vec3::ZERO);
        integrator.step(0.1, forward_only(), &dirs, &mut c, &CollisionGuard::new(None), &mut LinearStrafe);
        let partial = c.facing();
        assert!(partial.dot(Vec3::NEG_Z) < 0.99, "should not snap, got {:?}", partial);
        for _ in 0..20 {
            integrator.step(0.1, forward_only(), &dirs, &mut c, &CollisionGuard::new(None), &mut LinearStrafe);
        }
        assert!(c.facing().abs_diff_eq(Vec3::NEG_Z, 1e-3), "got {:?}", c.facing());
    }

    #[test]
    fn test_lateral_motion_hooks() {
        #[derive(Default)]
        struct Recorder {
            carried: Vec3,
            commits: u32,
            discards: u32,
        }
        impl LateralMotion for Recorder {
            fn propose(&mut self, _origin: Vec3, side: Vec3, distance: f32) -> Vec3 {
                side * distance
            }
            fn commit(&mut self) {
                self.commits += 1;
            }
            fn discard(&mut self) {
                self.discards += 1;
            }
            fn carry(&mut self, offset: Vec3) {
                self.carried += offset;
            }
        }

        let mut integrator = MovementIntegrator::new(1.0, FacingPolicy::Snap);
        let dirs = direction::resolve(&level_camera());
        let mut recorder = Recorder::default();
        let mut c = character_at(Vec3::ZERO);
        let intents = Intents { forward: true, left: true, ..Intents::default() };
        integrator.step(0.5, intents, &dirs, &mut c, &CollisionGuard::new(None), &mut recorder);
        assert!(recorder.carried.abs_diff_eq(Vec3::new(0.0, 0.0, -0.5), 1e-6));
        assert_eq!((recorder.commits, recorder.discards), (1, 0));

        let volumes = vec![volume(Vec3::new(-5.0, 0.0, -5.0), Vec3::new(-0.8, 1.0, 5.0))];
        let guard = CollisionGuard::new(Some(volumes.as_slice()));
        let intents = Intents { left: true, ..Intents::default() };
        integrator.step(0.5, intents, &dirs, &mut c, &guard, &mut recorder);
        assert_eq!((recorder.commits, recorder.discards), (1, 1));
    }
}
