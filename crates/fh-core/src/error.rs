use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Unknown parameter: {name}")]
    UnknownParam { name: String },

    #[error("Malformed payload for {param}: {payload:?}")]
    MalformedPayload { param: &'static str, payload: String },
}
