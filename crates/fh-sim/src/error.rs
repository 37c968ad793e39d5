//! Error types for simulation runs.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Controller error: {0}")]
    Controller(#[from] fh_app::AppError),
}

pub type SimResult<T> = Result<T, SimError>;
