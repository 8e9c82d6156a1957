//! Host error types.

use relay_router::ActionError;
use thiserror::Error;

/// Host error type.
#[derive(Error, Debug)]
pub enum HostError {
    /// No entity with this ID
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// Patch or created data does not describe a valid entity
    #[error("Invalid entity data: {0}")]
    InvalidData(String),

    /// Dice formula could not be parsed
    #[error("Invalid dice formula: {0}")]
    InvalidFormula(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using HostError.
pub type HostResult<T> = Result<T, HostError>;

impl From<HostError> for ActionError {
    fn from(e: HostError) -> Self {
        match e {
            HostError::InvalidData(_) | HostError::InvalidFormula(_) => {
                ActionError::InvalidParams(e.to_string())
            }
            other => ActionError::Host(other.to_string()),
        }
    }
}
