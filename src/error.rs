//! Error types for configuration loading and render setup.
//!
//! The terrain core itself has no error path: bad slot indices are contract
//! violations and panic.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to load or validate an [`AppConfig`](crate::params::AppConfig)
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Failure while bringing up the GPU
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to create surface: {0}")]
    SurfaceCreation(String),

    #[error("Failed to find suitable GPU adapter")]
    AdapterNotFound,

    #[error("Failed to request device: {0}")]
    DeviceCreation(String),
}
