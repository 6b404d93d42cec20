//! Rendering configuration.

use serde::Deserialize;

/// Rendering configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Window width (pixels)
    pub window_width: u32,

    /// Window height (pixels)
    pub window_height: u32,

    /// Vertical field of view (degrees)
    pub fov_degrees: f32,

    /// Near clipping plane (meters)
    pub near_plane_m: f32,

    /// Far clipping plane (meters)
    /// Default covers the 13x13 chunk window (520m across) with some margin
    pub far_plane_m: f32,

    /// Direction the sunlight travels (normalized in the shader)
    pub light_direction: [f32; 3],

    /// Sky clear color (linear RGB)
    pub sky_color: [f64; 3],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 960,
            window_height: 720,
            fov_degrees: 75.0,
            near_plane_m: 0.1,
            far_plane_m: 1000.0,
            light_direction: [-1.0, -1.0, -1.0],
            sky_color: [0.5, 0.8, 1.0],
        }
    }
}

impl RenderConfig {
    pub fn aspect_ratio(&self) -> f32 {
        self.window_width as f32 / self.window_height.max(1) as f32
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.window_width == 0 || self.window_height == 0 {
            return Err("render window size must be non-zero".to_string());
        }
        if !(self.near_plane_m > 0.0 && self.far_plane_m > self.near_plane_m) {
            return Err(format!(
                "render clip planes must satisfy 0 < near < far, got {} / {}",
                self.near_plane_m, self.far_plane_m
            ));
        }
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(format!("render.fov_degrees out of range: {}", self.fov_degrees));
        }
        Ok(())
    }
}
