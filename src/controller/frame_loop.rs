use super::camera_rig::{CameraMode, CameraRig};
use super::collision::CollisionGuard;
use super::direction;
use super::movement::{MovementIntegrator, StepOutcome};
use super::orbit::OrbitControl;
use super::volumes::SceneVolumes;
use crate::config::ControllerConfig;
use crate::model::{Camera, CharacterTransform, ControlFlag, Intents, SceneGraph, SharedControls};
use crate::view::DebugBounds;

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// `None` when the tick was skipped for lack of a camera or character.
    pub mode: Option<CameraMode>,
    pub outcome: StepOutcome,
    pub volumes_ready: bool,
}

fn orbit_control(orbit: &mut Option<Box<dyn OrbitControl>>) -> Option<&mut dyn OrbitControl> {
    match orbit {
        Some(control) => {
            let control: &mut dyn OrbitControl = control.as_mut();
            Some(control)
        }
        None => None,
    }
}

/// Per-frame driver: reads the control store, moves the character through
/// the collision guard and keeps the camera rig in step.
///
/// Camera, character, scene and orbit control are attached as they become
/// available; until both camera and character are present a tick does
/// nothing.
pub struct CharacterController {
    config: ControllerConfig,
    controls: SharedControls,
    camera: Option<Camera>,
    character: Option<CharacterTransform>,
    orbit: Option<Box<dyn OrbitControl>>,
    scene: Option<SceneGraph>,
    volumes: SceneVolumes,
    integrator: MovementIntegrator,
    rig: CameraRig,
    debug: DebugBounds,
    clock: f32,
}

impl CharacterController {
    pub fn new(config: ControllerConfig, controls: SharedControls) -> Self {
        let volumes = SceneVolumes::new(config.settle_delay_secs, config.reserved_names.clone());
        let integrator = MovementIntegrator::from_config(&config);
        Self {
            config,
            controls,
            camera: None,
            character: None,
            orbit: None,
            scene: None,
            volumes,
            integrator,
            rig: CameraRig::new(),
            debug: DebugBounds::new(),
            clock: 0.0,
        }
    }

    pub fn attach_camera(&mut self, camera: Camera) {
        self.camera = Some(camera);
        self.rig.invalidate();
    }

    pub fn attach_character(&mut self, character: CharacterTransform) {
        self.character = Some(character);
        self.rig.invalidate();
    }

    /// The scene is scanned for collision volumes once, after the settle delay.
    pub fn attach_scene(&mut self, scene: SceneGraph) {
        if self.volumes.is_built() {
            tracing::warn!("collision volumes already built, new scene is not rescanned");
        }
        self.scene = Some(scene);
    }

    pub fn attach_orbit(&mut self, control: Box<dyn OrbitControl>) {
        self.orbit = Some(control);
    }

    pub fn detach_orbit(&mut self) -> Option<Box<dyn OrbitControl>> {
        self.orbit.take()
    }

    pub fn orbit_mut(&mut self) -> Option<&mut dyn OrbitControl> {
        orbit_control(&mut self.orbit)
    }

    pub fn camera(&self) -> Option<&Camera> {
        self.camera.as_ref()
    }

    pub fn camera_mut(&mut self) -> Option<&mut Camera> {
        self.camera.as_mut()
    }

    pub fn character(&self) -> Option<&CharacterTransform> {
        self.character.as_ref()
    }

    pub fn scene(&self) -> Option<&SceneGraph> {
        self.scene.as_ref()
    }

    pub fn volumes(&self) -> &SceneVolumes {
        &self.volumes
    }

    pub fn debug_bounds(&self) -> &DebugBounds {
        &self.debug
    }

    pub fn rig(&self) -> &CameraRig {
        &self.rig
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn controls(&self) -> &SharedControls {
        &self.controls
    }

    /// Run one simulation step of `dt` seconds. Unusable deltas count as zero.
    pub fn tick(&mut self, dt: f32) -> TickReport {
        let dt = if dt.is_finite() && dt >= 0.0 {
            dt
        } else {
            tracing::trace!(dt, "tick delta treated as zero");
            0.0
        };
        self.clock += dt;

        let volumes_ready = match &self.scene {
            Some(scene) => self.volumes.poll(self.clock, scene),
            None => self.volumes.is_built(),
        };

        let (intents, orbit_requested, show_bounds) = {
            let store = self.controls.borrow();
            (
                Intents::read(&*store),
                store.get(ControlFlag::OrbitEnabled),
                store.get(ControlFlag::ShowBounds),
            )
        };
        self.debug.refresh(self.volumes.get(), show_bounds);

        let Self {
            camera,
            character,
            orbit,
            volumes,
            integrator,
            rig,
            ..
        } = self;
        let (Some(camera), Some(character)) = (camera.as_mut(), character.as_mut()) else {
            return TickReport {
                mode: None,
                outcome: StepOutcome::IDLE,
                volumes_ready,
            };
        };

        let mode = rig.begin_tick(orbit_requested, camera, character, orbit_control(orbit));
        let directions = direction::resolve(camera);
        let guard = CollisionGuard::new(volumes.get());
        let outcome = integrator.step(dt, intents, &directions, character, &guard, rig.lateral_motion(mode));
        rig.sync(mode, &outcome, camera, character, orbit_control(orbit), dt);

        TickReport {
            mode: Some(mode),
            outcome,
            volumes_ready,
        }
    }
}
