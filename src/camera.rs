//! Camera presets: free-fly and terrain-following cruise.
//!
//! The camera only produces a position and a view-projection matrix. The
//! terrain system receives the position as a plain argument every frame.

use glam::{Mat4, Vec3};

use crate::params::{CameraPreset, CruisePath, FreeCamera, RenderConfig};

/// Closest the free camera may get to the ground (meters)
const MIN_GROUND_CLEARANCE_M: f32 = 2.0;

/// Pitch limit, keeps the view matrix away from the up-vector singularity
const MAX_PITCH_RAD: f32 = 1.5;

/// Movement keys understood by the free camera
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, Default)]
struct MovementState {
    forward: bool,
    backward: bool,
    left: bool,
    right: bool,
    up: bool,
    down: bool,
}

impl MovementState {
    fn set(&mut self, movement: Movement, pressed: bool) {
        let flag = match movement {
            Movement::Forward => &mut self.forward,
            Movement::Backward => &mut self.backward,
            Movement::Left => &mut self.left,
            Movement::Right => &mut self.right,
            Movement::Up => &mut self.up,
            Movement::Down => &mut self.down,
        };
        *flag = pressed;
    }

    fn axis(positive: bool, negative: bool) -> f32 {
        positive as i32 as f32 - negative as i32 as f32
    }
}

/// Camera with either free-fly or cruise motion
pub struct CameraSystem {
    preset: CameraPreset,
    position: Vec3,
    yaw: f32,
    pitch: f32,
    movement: MovementState,
}

impl CameraSystem {
    /// Create new camera system with specified preset
    pub fn new(preset: CameraPreset) -> Self {
        let (position, yaw, pitch) = match &preset {
            CameraPreset::Free(p) => (
                Vec3::from_array(p.position),
                p.yaw_deg.to_radians(),
                p.pitch_deg.to_radians().clamp(-MAX_PITCH_RAD, MAX_PITCH_RAD),
            ),
            CameraPreset::Cruise(p) => (
                Vec3::new(0.0, p.min_altitude_m + p.clearance_m, 0.0),
                p.heading_deg.to_radians(),
                0.0,
            ),
        };
        Self {
            preset,
            position,
            yaw,
            pitch,
            movement: MovementState::default(),
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn preset(&self) -> &CameraPreset {
        &self.preset
    }

    /// Unit view direction (yaw 0 = +z)
    pub fn forward(&self) -> Vec3 {
        Vec3::new(
            self.yaw.sin() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.cos() * self.pitch.cos(),
        )
    }

    /// Press or release a movement key (free preset only)
    pub fn set_movement(&mut self, movement: Movement, pressed: bool) {
        self.movement.set(movement, pressed);
    }

    /// Mouse look by `(dx, dy)` pixels (free preset only)
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        if let CameraPreset::Free(p) = &self.preset {
            self.yaw -= dx * p.look_sensitivity;
            self.pitch = (self.pitch - dy * p.look_sensitivity).clamp(-MAX_PITCH_RAD, MAX_PITCH_RAD);
        }
    }

    /// Advance the camera by `dt` seconds
    ///
    /// # Arguments
    /// * `dt` - Frame time in seconds
    /// * `ground_height` - Terrain height in meters at world `(x, z)`
    pub fn update(&mut self, dt: f32, ground_height: impl Fn(f32, f32) -> f32) {
        match &self.preset {
            CameraPreset::Free(p) => {
                let p = p.clone();
                self.update_free(&p, dt, &ground_height);
            }
            CameraPreset::Cruise(p) => {
                let p = p.clone();
                self.update_cruise(&p, dt, &ground_height);
            }
        }
    }

    fn update_free(&mut self, p: &FreeCamera, dt: f32, ground_height: &impl Fn(f32, f32) -> f32) {
        let m = self.movement;
        let heading = Vec3::new(self.yaw.sin(), 0.0, self.yaw.cos());
        let right = heading.cross(Vec3::Y);

        let planar = heading * MovementState::axis(m.forward, m.backward)
            + right * MovementState::axis(m.right, m.left);
        let vertical = MovementState::axis(m.up, m.down);

        self.position += planar.normalize_or_zero() * p.move_speed_m_per_s * dt;
        self.position.y += vertical * p.fly_speed_m_per_s * dt;

        let floor = ground_height(self.position.x, self.position.z).max(0.0) + MIN_GROUND_CLEARANCE_M;
        self.position.y = self.position.y.max(floor);
    }

    fn update_cruise(&mut self, p: &CruisePath, dt: f32, ground_height: &impl Fn(f32, f32) -> f32) {
        let heading = Vec3::new(self.yaw.sin(), 0.0, self.yaw.cos());
        self.position += heading * p.forward_speed_m_per_s * dt;

        let ground = ground_height(self.position.x, self.position.z);
        self.position.y = (ground + p.clearance_m).max(p.min_altitude_m);

        // Look ahead and down toward the terrain
        let target = self.position + heading * p.look_ahead_m - Vec3::Y * self.position.y * 0.4;
        let to_target = (target - self.position).normalize();
        self.pitch = to_target.y.asin();
    }

    /// Create view-projection matrix for rendering
    pub fn view_proj(&self, render_config: &RenderConfig) -> Mat4 {
        let view = Mat4::look_to_rh(self.position, self.forward(), Vec3::Y);
        let proj = Mat4::perspective_rh(
            render_config.fov_degrees.to_radians(),
            render_config.aspect_ratio(),
            render_config.near_plane_m,
            render_config.far_plane_m,
        );
        proj * view
    }
}
