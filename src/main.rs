//! infworld - fly over procedurally generated, endlessly streaming terrain.

use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use log::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorGrabMode, Window, WindowId},
};

use infworld::camera::{CameraSystem, Movement};
use infworld::cli::Args;
use infworld::params::{AppConfig, CameraPreset};
use infworld::rendering::{GpuChunk, RenderSystem};
use infworld::terrain::{MeshStore, TerrainSystem, UpdateOutcome};

/// Fixed timestep for headless runs (seconds)
const HEADLESS_DT: f32 = 1.0 / 60.0;

/// Main application state
struct App {
    // Window and rendering
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,

    // Simulation systems
    terrain: Option<TerrainSystem<GpuChunk>>,
    camera: CameraSystem,

    // Configuration
    config: AppConfig,
    seed: u32,

    // Input and time tracking
    cursor_captured: bool,
    last_frame: Instant,
}

impl App {
    fn new(config: AppConfig, seed: u32) -> Self {
        let camera = CameraSystem::new(config.camera.preset());
        Self {
            window: None,
            render_system: None,
            terrain: None,
            camera,
            config,
            seed,
            cursor_captured: false,
            last_frame: Instant::now(),
        }
    }

    fn set_cursor_capture(&mut self, captured: bool) {
        let Some(window) = &self.window else {
            return;
        };
        let result = if captured {
            window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined))
        } else {
            window.set_cursor_grab(CursorGrabMode::None)
        };
        if let Err(e) = result {
            warn!("Cursor grab not available: {}", e);
        }
        window.set_cursor_visible(!captured);
        self.cursor_captured = captured;
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        // Create window
        let window_attributes = Window::default_attributes()
            .with_title("infworld")
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.render.window_width,
                self.config.render.window_height,
            ));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        // Initialize rendering system
        let mut render_system = match pollster::block_on(RenderSystem::new(
            Arc::clone(&window),
            &self.config.render,
            &self.config.terrain,
        )) {
            Ok(render_system) => render_system,
            Err(e) => {
                error!("{}", e);
                event_loop.exit();
                return;
            }
        };

        let (width, height) = render_system.size();
        self.config.render.window_width = width;
        self.config.render.window_height = height;

        // Build the initial chunk window around the camera
        let start = Instant::now();
        let terrain = TerrainSystem::new(
            self.seed,
            self.config.terrain.clone(),
            self.camera.position(),
            &mut render_system,
        );
        info!("Initial terrain ready in {:.0?}", start.elapsed());
        render_system.update_water(terrain.table().center());

        self.window = Some(window);
        self.render_system = Some(render_system);
        self.terrain = Some(terrain);

        if matches!(self.camera.preset(), CameraPreset::Free(_)) {
            self.set_cursor_capture(true);
            info!("WASD to move, space/shift to fly, ESC toggles the mouse");
        }
        self.last_frame = Instant::now();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(render_system) = &mut self.render_system {
                    render_system.resize(size.width, size.height);
                    let (width, height) = render_system.size();
                    self.config.render.window_width = width;
                    self.config.render.window_height = height;
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state,
                        physical_key: PhysicalKey::Code(code),
                        repeat: false,
                        ..
                    },
                ..
            } => {
                let pressed = state == ElementState::Pressed;
                let movement = match code {
                    KeyCode::KeyW => Some(Movement::Forward),
                    KeyCode::KeyS => Some(Movement::Backward),
                    KeyCode::KeyA => Some(Movement::Left),
                    KeyCode::KeyD => Some(Movement::Right),
                    KeyCode::Space => Some(Movement::Up),
                    KeyCode::ShiftLeft => Some(Movement::Down),
                    KeyCode::Escape if !pressed => {
                        self.set_cursor_capture(!self.cursor_captured);
                        None
                    }
                    _ => None,
                };
                if let Some(movement) = movement {
                    self.camera.set_movement(movement, pressed);
                }
            }
            WindowEvent::RedrawRequested => {
                if !self.render_frame() {
                    event_loop.exit();
                }
            }
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            if self.cursor_captured {
                self.camera.rotate(dx as f32, dy as f32);
            }
        }
    }
}

impl App {
    /// Render a single frame; returns false on an unrecoverable surface error
    fn render_frame(&mut self) -> bool {
        let (Some(render_system), Some(terrain)) = (&mut self.render_system, &mut self.terrain) else {
            return true;
        };

        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32().min(0.1);
        self.last_frame = now;

        // Move the camera, then stream at most one chunk for its new position
        self.camera.update(dt, |x, z| terrain.height_at(x, z));
        if let UpdateOutcome::Shifted { center, .. } = terrain.update(self.camera.position(), render_system) {
            render_system.update_water(center);
        }

        render_system.update_view_proj(self.camera.view_proj(&self.config.render));

        match render_system.render(terrain.table().slots().map(|slot| &slot.buffers)) {
            Ok(()) => true,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                warn!("Surface lost, reconfiguring");
                let (width, height) = render_system.size();
                render_system.resize(width, height);
                true
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("GPU out of memory");
                false
            }
            Err(e) => {
                warn!("Render error: {:?}", e);
                true
            }
        }
    }
}

/// Fly the cruise path without a window and report streaming statistics
fn run_headless(config: &AppConfig, seed: u32, frames: u32) {
    let preset = match config.camera.preset() {
        CameraPreset::Free(_) => {
            info!("Headless run uses the cruise camera");
            CameraPreset::Cruise(config.camera.cruise.clone())
        }
        cruise => cruise,
    };
    let mut camera = CameraSystem::new(preset);
    let mut store = MeshStore::new();

    let start = Instant::now();
    let mut terrain = TerrainSystem::new(seed, config.terrain.clone(), camera.position(), &mut store);
    info!(
        "Built {} chunks (range {}, precision {}) in {:.0?}",
        terrain.table().count(),
        terrain.params().range,
        terrain.params().precision,
        start.elapsed()
    );

    let mut shifts = 0;
    let mut slowest = Duration::ZERO;
    let mut total = Duration::ZERO;

    for _ in 0..frames {
        camera.update(HEADLESS_DT, |x, z| terrain.height_at(x, z));

        let frame_start = Instant::now();
        let outcome = terrain.update(camera.position(), &mut store);
        let elapsed = frame_start.elapsed();

        total += elapsed;
        slowest = slowest.max(elapsed);
        if matches!(outcome, UpdateOutcome::Shifted { .. }) {
            shifts += 1;
        }
    }

    let position = camera.position();
    info!(
        "{} frames: {} window shifts, {} chunks regenerated, {} pending",
        frames,
        shifts,
        store.uploaded(),
        terrain.table().pending_len()
    );
    info!(
        "Terrain update: {:.2?} avg, {:.2?} worst",
        total / frames.max(1),
        slowest
    );
    info!(
        "Camera at ({:.1}, {:.1}, {:.1}), center chunk {}",
        position.x,
        position.y,
        position.z,
        terrain.table().center()
    );
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    let seed = args.resolve_seed();
    info!("infworld seed {}", seed);

    if let Some(frames) = args.headless {
        run_headless(&config, seed, frames);
        return;
    }

    let mut app = App::new(config, seed);
    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            error!("Failed to create event loop: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = event_loop.run_app(&mut app) {
        error!("Event loop error: {}", e);
        std::process::exit(1);
    }
}
