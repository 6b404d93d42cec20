//! Parameter definitions with physical units and documented semantics.
//!
//! All tunables live here with:
//! - Units (meters, noise units, seconds)
//! - Documented defaults
//! - Optional TOML overrides through [`AppConfig::load`]

mod camera;
mod render;
mod terrain;

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

// Re-export all types
pub use camera::{CameraParams, CameraPreset, CruisePath, FreeCamera, PresetKind};
pub use render::RenderConfig;
pub use terrain::{TerrainParams, MAX_PRECISION, MAX_RANGE};

/// Complete application configuration, as read from a TOML file
///
/// ```toml
/// [terrain]
/// range = 4
/// octaves = 6
///
/// [camera]
/// preset = "cruise"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub terrain: TerrainParams,
    pub camera: CameraParams,
    pub render: RenderConfig,
}

impl AppConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.terrain.validate().map_err(ConfigError::Invalid)?;
        self.camera.validate().map_err(ConfigError::Invalid)?;
        self.render.validate().map_err(ConfigError::Invalid)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config.terrain.precision, TerrainParams::default().precision);
        assert_eq!(config.camera.preset, PresetKind::Free);
    }

    #[test]
    fn test_partial_override() {
        let config = AppConfig::from_toml_str(
            r#"
            [terrain]
            range = 2
            octaves = 4

            [camera]
            preset = "cruise"

            [camera.cruise]
            forward_speed_m_per_s = 20.0
            "#,
        )
        .unwrap();
        assert_eq!(config.terrain.range, 2);
        assert_eq!(config.terrain.octaves, 4);
        assert_eq!(config.terrain.precision, 32);
        assert!(matches!(
            config.camera.preset(),
            CameraPreset::Cruise(ref c) if c.forward_speed_m_per_s == 20.0
        ));
    }

    #[test]
    fn test_custom_curve() {
        let config = AppConfig::from_toml_str(
            r#"
            [terrain.curve]
            points = [[-1.0, -0.5], [0.0, 0.0], [1.0, 1.0]]
            "#,
        )
        .unwrap();
        assert_eq!(config.terrain.curve.points().len(), 3);
    }

    #[test]
    fn test_invalid_curve_rejected() {
        let err = AppConfig::from_toml_str(
            r#"
            [terrain.curve]
            points = [[0.5, 0.0], [0.1, 1.0]]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_oversized_grid_rejected() {
        let err = AppConfig::from_toml_str("[terrain]\nprecision = 30000\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref msg) if msg.contains("precision")));
    }

    #[test]
    fn test_syntax_error_is_parse_error() {
        let err = AppConfig::from_toml_str("[terrain\nrange = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = AppConfig::load(Path::new("/nonexistent/infworld.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
