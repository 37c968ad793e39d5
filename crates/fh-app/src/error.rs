//! Error types for the controller application layer.

use std::path::PathBuf;

use fh_controls::ControlError;
use fh_core::CoreError;
use fh_sensors::SensorError;
use fh_valve::ValveError;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {path}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write config file: {path}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid {section} config: {what}")]
    Invalid { section: &'static str, what: String },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Application error type wrapping the component crates' errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Sensor setup failed: {0}")]
    Sensor(#[from] SensorError),

    #[error("Regulator setup failed: {0}")]
    Control(#[from] ControlError),

    #[error("Valve setup failed: {0}")]
    Valve(#[from] ValveError),

    #[error("Rejected parameter: {0}")]
    Param(#[from] CoreError),

    #[error("Invalid scheduler argument: {what}")]
    Schedule { what: &'static str },
}

pub type AppResult<T> = Result<T, AppError>;
