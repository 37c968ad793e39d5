use thiserror::Error;

pub type ValveResult<T> = Result<T, ValveError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValveError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },
}
