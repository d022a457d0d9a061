use std::time::Instant;

use winit::{
    event::*,
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

// Import from the library crate
use glade::{config::ControllerConfig, controller, error::ConfigError, logging, model};

use controller::input::native::key_code;
use controller::orbit::{self, OrbitControls};
use controller::{AnimationTrigger, CharacterController, InputMapper};
use model::{scenery, ControlFlag, ControlState, SharedControls};

/// Seconds between status lines.
const STATUS_INTERVAL: f32 = 1.0;

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    #[error("event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("window: {0}")]
    Window(#[from] winit::error::OsError),
}

struct App {
    window: Window,
    controls: SharedControls,
    mapper: InputMapper,
    controller: CharacterController,
    animation: AnimationTrigger,

    // Pointer drag for the orbit control
    dragging: bool,
    last_mouse_pos: Option<(f64, f64)>,

    // Frame timing
    last_frame_time: Instant,
    status_timer: f32,
}

impl App {
    fn new(window: Window, config: ControllerConfig) -> Self {
        let size = window.inner_size();
        let controls = ControlState::shared();
        let mapper = InputMapper::new(config.bindings.clone(), config.release_policy);
        let animation = AnimationTrigger::attach(&mut *controls.borrow_mut());

        let camera = scenery::demo_camera(size.width, size.height);
        let character = scenery::demo_character(&camera);
        let mut controller = CharacterController::new(config, controls.clone());
        controller.attach_scene(scenery::demo_scene());
        controller.attach_camera(camera);
        controller.attach_character(character);
        controller.attach_orbit(Box::new(OrbitControls::new()));

        Self {
            window,
            controls,
            mapper,
            controller,
            animation,
            dragging: false,
            last_mouse_pos: None,
            last_frame_time: Instant::now(),
            status_timer: 0.0,
        }
    }

    fn toggle(&mut self, flag: ControlFlag) {
        let mut store = self.controls.borrow_mut();
        let value = !store.get(flag);
        store.set(flag, value);
        tracing::info!(?flag, value, "toggled");
    }

    fn input(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput { event: KeyEvent { state, physical_key, repeat, .. }, .. } => {
                if let Some(code) = key_code(*physical_key) {
                    let mut store = self.controls.borrow_mut();
                    match state {
                        ElementState::Pressed => self.mapper.key_down(code, &mut *store),
                        ElementState::Released => self.mapper.key_up(code, &mut *store),
                    };
                } else if *state == ElementState::Pressed && !repeat {
                    // host-only switches standing in for the page checkboxes
                    match physical_key {
                        PhysicalKey::Code(KeyCode::KeyO) => self.toggle(ControlFlag::OrbitEnabled),
                        PhysicalKey::Code(KeyCode::KeyB) => self.toggle(ControlFlag::ShowBounds),
                        _ => {}
                    }
                }
                true
            }
            WindowEvent::Focused(false) => {
                self.mapper.release_all(&mut *self.controls.borrow_mut());
                self.dragging = false;
                true
            }
            WindowEvent::MouseInput { state, button: MouseButton::Left, .. } => {
                self.dragging = *state == ElementState::Pressed;
                self.last_mouse_pos = None;
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self.dragging {
                    if let Some((lx, ly)) = self.last_mouse_pos {
                        let delta = orbit::drag_rotation(
                            (position.x - lx) as f32,
                            (position.y - ly) as f32,
                            orbit::DRAG_RADIANS_PER_PIXEL,
                        );
                        if let Some(control) = self.controller.orbit_mut() {
                            control.rotate(delta);
                        }
                    }
                    self.last_mouse_pos = Some((position.x, position.y));
                }
                true
            }
            _ => false,
        }
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            if let Some(camera) = self.controller.camera_mut() {
                camera.set_aspect(new_size.width, new_size.height);
            }
        }
    }

    fn update(&mut self) {
        let now = Instant::now();
        let dt = self.controller.config().tick_delta((now - self.last_frame_time).as_secs_f64());
        self.last_frame_time = now;

        let report = self.controller.tick(dt);
        if let Some(cue) = self.animation.poll() {
            tracing::debug!(cue = cue.as_str(), "animation");
        }

        self.status_timer += dt;
        if self.status_timer >= STATUS_INTERVAL {
            self.status_timer = 0.0;
            let character = self.controller.character().map(|c| c.position);
            let camera = self.controller.camera().map(|c| c.position);
            tracing::info!(
                mode = ?report.mode,
                volumes_ready = report.volumes_ready,
                ?character,
                ?camera,
                "status"
            );
        }
    }
}

fn run() -> Result<(), AppError> {
    let config = match std::env::var("GLADE_CONFIG") {
        Ok(path) => {
            tracing::info!(%path, "loading controller config");
            ControllerConfig::load(path)?
        }
        Err(_) => ControllerConfig::default(),
    };

    let event_loop = EventLoop::new()?;
    let window_attributes = Window::default_attributes()
        .with_title("Glade - Native")
        .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
    let window = event_loop.create_window(window_attributes)?;

    let mut app = App::new(window, config);

    event_loop.run(move |event, elwt| {
        match event {
            Event::WindowEvent {
                ref event,
                window_id,
            } if window_id == app.window.id() => {
                if !app.input(event) {
                    match event {
                        WindowEvent::CloseRequested => elwt.exit(),
                        WindowEvent::Resized(physical_size) => app.resize(*physical_size),
                        WindowEvent::RedrawRequested => app.update(),
                        _ => {}
                    }
                }
            }
            Event::AboutToWait => {
                app.window.request_redraw();
            }
            _ => {}
        }
    })?;
    Ok(())
}

fn main() {
    logging::init();
    if let Err(e) = run() {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
