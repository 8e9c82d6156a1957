//! Hub error types.

use thiserror::Error;

/// Hub error type.
#[derive(Error, Debug)]
pub enum HubError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Socket error
    #[error("Socket error: {0}")]
    Socket(String),

    /// Connection closed
    #[error("Connection closed")]
    ConnectionClosed,
}

/// Result type alias using HubError.
pub type HubResult<T> = Result<T, HubError>;
