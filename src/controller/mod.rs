// CONTROLLER: input, movement, collision and the per-tick loop
pub mod animation;
pub mod camera_rig;
pub mod collision;
pub mod direction;
pub mod frame_loop;
pub mod input;
pub mod movement;
pub mod orbit;
pub mod volumes;

pub use animation::{AnimationCue, AnimationTrigger};
pub use camera_rig::{CameraMode, CameraRig, RotationOwner, TrackPivot};
pub use collision::{CollisionGuard, Probe};
pub use direction::Directions;
pub use frame_loop::{CharacterController, TickReport};
pub use input::{ControlKey, InputMapper, KeyBindings, KeyDisposition, ReleasePolicy};
pub use movement::{AxisStep, FacingPolicy, LateralMotion, LinearStrafe, MovementIntegrator, StepOutcome};
pub use orbit::{OrbitControl, OrbitControls};
pub use volumes::{BoundingVolume, SceneVolumes};
