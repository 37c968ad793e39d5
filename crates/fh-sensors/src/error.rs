//! Error types for sensor conditioning.

use thiserror::Error;

/// Result type for sensor operations.
pub type SensorResult<T> = Result<T, SensorError>;

/// Errors raised while building a sensor pipeline.
///
/// Readings themselves never fail; these only cover bad configuration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SensorError {
    /// Invalid configuration value.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },
}
