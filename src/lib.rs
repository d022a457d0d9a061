// Re-export all public modules so they can be used from main.rs
pub mod config;
pub mod error;
pub mod logging;

// MVC Architecture
pub mod model;
pub mod view;
pub mod controller;

pub use config::ControllerConfig;
pub use controller::CharacterController;
pub use error::ConfigError;

#[cfg(target_arch = "wasm32")]
use std::{cell::RefCell, rc::Rc};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::{prelude::wasm_bindgen, JsValue};

#[cfg(target_arch = "wasm32")]
use controller::{
    input::wasm::KeyListeners, orbit, AnimationTrigger, InputMapper, OrbitControls,
};
#[cfg(target_arch = "wasm32")]
use model::{scenery, ControlFlag, ControlState, SharedControls};

/// Browser entry point. The page owns rendering and the UI; it drives
/// `tick` from `requestAnimationFrame` and reads transforms back.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub struct GladeApp {
    controls: SharedControls,
    controller: CharacterController,
    animation: AnimationTrigger,
    last_time: Option<f64>,
    _listeners: KeyListeners,
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
impl GladeApp {
    /// Set up the demo clearing. `config_json` overrides controller defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, config_json: Option<String>) -> Result<GladeApp, JsValue> {
        logging::init();

        let config = match config_json {
            Some(raw) => ControllerConfig::from_json_str(&raw).map_err(|e| js_error(e.to_string()))?,
            None => ControllerConfig::default(),
        };

        let window = web_sys::window().ok_or_else(|| js_error("no global `window`"))?;
        let document = window.document().ok_or_else(|| js_error("no document on window"))?;

        let controls = ControlState::shared();
        let mapper = Rc::new(RefCell::new(InputMapper::new(
            config.bindings.clone(),
            config.release_policy,
        )));
        let listeners = KeyListeners::attach(&window, &document, mapper, controls.clone())?;
        let animation = AnimationTrigger::attach(&mut *controls.borrow_mut());

        let camera = scenery::demo_camera(width, height);
        let character = scenery::demo_character(&camera);
        let mut controller = CharacterController::new(config, controls.clone());
        controller.attach_scene(scenery::demo_scene());
        controller.attach_camera(camera);
        controller.attach_character(character);
        controller.attach_orbit(Box::new(OrbitControls::new()));

        tracing::info!(width, height, "glade initialised");
        Ok(GladeApp {
            controls,
            controller,
            animation,
            last_time: None,
            _listeners: listeners,
        })
    }

    /// Advance by the time since the previous call (`performance.now()`
    /// milliseconds). Returns whether the character moved.
    pub fn tick(&mut self, now_ms: f64) -> bool {
        let dt = match self.last_time {
            Some(last) => self.controller.config().tick_delta((now_ms - last) / 1000.0),
            None => 0.0,
        };
        self.last_time = Some(now_ms);

        let report = self.controller.tick(dt);
        if let Some(cue) = self.animation.poll() {
            tracing::trace!(cue = cue.as_str(), "animation");
        }
        tracing::trace!(?report, "tick");
        report.outcome.moved()
    }

    pub fn set_orbit_enabled(&mut self, enabled: bool) {
        self.controls.borrow_mut().set(ControlFlag::OrbitEnabled, enabled);
    }

    pub fn orbit_enabled(&self) -> bool {
        self.controls.borrow().get(ControlFlag::OrbitEnabled)
    }

    pub fn set_show_bounds(&mut self, show: bool) {
        self.controls.borrow_mut().set(ControlFlag::ShowBounds, show);
    }

    /// Pointer drag in pixels, fed to the orbit control.
    pub fn drag(&mut self, dx: f32, dy: f32) {
        if let Some(control) = self.controller.orbit_mut() {
            control.rotate(orbit::drag_rotation(dx, dy, orbit::DRAG_RADIANS_PER_PIXEL));
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if let Some(camera) = self.controller.camera_mut() {
            camera.set_aspect(width, height);
        }
    }

    /// `[x, y, z]`
    pub fn character_position(&self) -> Vec<f32> {
        self.controller
            .character()
            .map(|c| c.position.to_array().to_vec())
            .unwrap_or_default()
    }

    /// `[x, y, z, w]`
    pub fn character_rotation(&self) -> Vec<f32> {
        self.controller
            .character()
            .map(|c| c.rotation.to_array().to_vec())
            .unwrap_or_default()
    }

    pub fn camera_position(&self) -> Vec<f32> {
        self.controller
            .camera()
            .map(|c| c.position.to_array().to_vec())
            .unwrap_or_default()
    }

    pub fn camera_rotation(&self) -> Vec<f32> {
        self.controller
            .camera()
            .map(|c| c.rotation.to_array().to_vec())
            .unwrap_or_default()
    }

    /// Line-segment endpoints of the collision boxes, empty while hidden.
    pub fn debug_bounds_vertices(&self) -> Vec<f32> {
        self.controller
            .debug_bounds()
            .visible_mesh()
            .map(|mesh| mesh.line_positions())
            .unwrap_or_default()
    }

    /// `"run"` or `"idle"`.
    pub fn animation_cue(&self) -> String {
        self.animation.cue().as_str().to_string()
    }

    /// `"orbit"`, `"follow"`, or empty before the first tick.
    pub fn camera_mode(&self) -> String {
        match self.controller.rig().mode() {
            Some(controller::CameraMode::Orbit) => "orbit".to_string(),
            Some(controller::CameraMode::Follow) => "follow".to_string(),
            None => String::new(),
        }
    }
}

#[cfg(target_arch = "wasm32")]
impl Drop for GladeApp {
    fn drop(&mut self) {
        self.animation.detach(&mut *self.controls.borrow_mut());
    }
}

#[cfg(target_arch = "wasm32")]
fn js_error<E: Into<String>>(msg: E) -> JsValue {
    JsValue::from_str(&msg.into())
}
