//! Command-line argument parsing.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;
use log::warn;

use crate::error::ConfigError;
use crate::params::{AppConfig, PresetKind};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "infworld")]
#[command(about = "Procedurally generated infinite terrain", long_about = None)]
pub struct Args {
    /// World seed (defaults to a clock-derived value)
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u32>,

    /// Chunks kept loaded in each direction around the camera
    #[arg(long, value_name = "CHUNKS")]
    pub range: Option<u32>,

    /// TOML file overriding terrain, camera and render parameters
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Camera preset: free (default) or cruise
    #[arg(long, value_name = "PRESET")]
    pub camera_preset: Option<String>,

    /// Cruise speed (meters per second)
    #[arg(long, value_name = "M/S")]
    pub speed: Option<f32>,

    /// Run without a window for this many frames and log streaming stats
    #[arg(long, value_name = "FRAMES")]
    pub headless: Option<u32>,
}

impl Args {
    /// Load the config file (if any) and apply command-line overrides
    pub fn load_config(&self) -> Result<AppConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load(path)?,
            None => AppConfig::default(),
        };

        if let Some(range) = self.range {
            config.terrain.range = range;
        }
        if let Some(speed) = self.speed {
            config.camera.cruise.forward_speed_m_per_s = speed;
        }
        if let Some(preset) = &self.camera_preset {
            match preset.parse::<PresetKind>() {
                Ok(kind) => config.camera.preset = kind,
                Err(e) => warn!("{}, keeping {:?}", e, config.camera.preset),
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Seed from the command line, or one derived from the system clock
    pub fn resolve_seed(&self) -> u32 {
        self.seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs() as u32 ^ d.subsec_nanos())
                .unwrap_or(0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_apply() {
        let args = Args::parse_from([
            "infworld",
            "--seed",
            "42",
            "--range",
            "3",
            "--camera-preset",
            "cruise",
            "--speed",
            "12.5",
        ]);
        let config = args.load_config().unwrap();
        assert_eq!(args.resolve_seed(), 42);
        assert_eq!(config.terrain.range, 3);
        assert_eq!(config.camera.preset, PresetKind::Cruise);
        assert_eq!(config.camera.cruise.forward_speed_m_per_s, 12.5);
    }

    #[test]
    fn test_unknown_preset_keeps_default() {
        let args = Args::parse_from(["infworld", "--camera-preset", "orbit"]);
        let config = args.load_config().unwrap();
        assert_eq!(config.camera.preset, PresetKind::Free);
    }

    #[test]
    fn test_headless_flag() {
        let args = Args::parse_from(["infworld", "--headless", "600"]);
        assert_eq!(args.headless, Some(600));
        assert!(args.seed.is_none());
    }
}
