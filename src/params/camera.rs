//! Camera configuration and presets.

use serde::Deserialize;

/// Free-fly camera driven by keyboard and mouse
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FreeCamera {
    /// Start position (meters)
    pub position: [f32; 3],

    /// Initial heading around +y (degrees, 0 = looking down +z)
    pub yaw_deg: f32,

    /// Initial pitch (degrees, negative = looking down)
    pub pitch_deg: f32,

    /// Horizontal movement speed (meters per second)
    pub move_speed_m_per_s: f32,

    /// Vertical movement speed (meters per second)
    pub fly_speed_m_per_s: f32,

    /// Radians of rotation per pixel of mouse motion
    pub look_sensitivity: f32,
}

impl Default for FreeCamera {
    fn default() -> Self {
        Self {
            position: [0.0, 80.0, 0.0],
            yaw_deg: 0.0,
            pitch_deg: -15.0,
            move_speed_m_per_s: 60.0,
            fly_speed_m_per_s: 40.0,
            look_sensitivity: 0.003,
        }
    }
}

/// Straight-line flight that follows the terrain at a fixed clearance
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CruisePath {
    /// Height above the terrain (meters)
    pub clearance_m: f32,

    /// Minimum altitude, keeps the camera above the water plane (meters)
    pub min_altitude_m: f32,

    /// Forward speed (meters per second)
    pub forward_speed_m_per_s: f32,

    /// Flight heading around +y (degrees, 0 = +z)
    pub heading_deg: f32,

    /// Look-ahead distance (meters)
    pub look_ahead_m: f32,
}

impl Default for CruisePath {
    fn default() -> Self {
        Self {
            clearance_m: 30.0,
            min_altitude_m: 10.0,
            forward_speed_m_per_s: 80.0,
            heading_deg: 30.0,
            look_ahead_m: 150.0,
        }
    }
}

/// Which preset the camera starts in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PresetKind {
    #[default]
    Free,
    Cruise,
}

impl std::str::FromStr for PresetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" => Ok(Self::Free),
            "cruise" => Ok(Self::Cruise),
            other => Err(format!("unknown camera preset '{}'", other)),
        }
    }
}

/// Camera preset selection
#[derive(Debug, Clone)]
pub enum CameraPreset {
    /// Free preset: WASD + mouse look, space/shift to fly
    Free(FreeCamera),

    /// Cruise preset: automatic flight over the terrain
    Cruise(CruisePath),
}

impl Default for CameraPreset {
    fn default() -> Self {
        Self::Free(FreeCamera::default())
    }
}

/// Camera section of the config file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CameraParams {
    pub preset: PresetKind,
    pub free: FreeCamera,
    pub cruise: CruisePath,
}

impl CameraParams {
    /// Resolve the selected preset
    pub fn preset(&self) -> CameraPreset {
        match self.preset {
            PresetKind::Free => CameraPreset::Free(self.free.clone()),
            PresetKind::Cruise => CameraPreset::Cruise(self.cruise.clone()),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.free.move_speed_m_per_s < 0.0 || self.free.fly_speed_m_per_s < 0.0 {
            return Err("camera.free speeds must be >= 0".to_string());
        }
        if self.cruise.forward_speed_m_per_s < 0.0 {
            return Err("camera.cruise.forward_speed_m_per_s must be >= 0".to_string());
        }
        if self.cruise.look_ahead_m <= 0.0 {
            return Err("camera.cruise.look_ahead_m must be > 0".to_string());
        }
        Ok(())
    }
}
