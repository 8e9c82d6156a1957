//! Router and action error types.

use relay_protocol_types::error_codes;
use std::time::Duration;
use thiserror::Error;

/// Failure raised by a business action handler.
///
/// Lookups that find nothing are not errors: handlers report them as data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// Payload missing or malformed
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// Host rejected a read or write
    #[error("Host error: {0}")]
    Host(String),

    /// Any other business failure
    #[error("Action failed: {0}")]
    Failed(String),
}

impl ActionError {
    /// Wire error code for this failure.
    pub fn code(&self) -> i32 {
        match self {
            ActionError::InvalidParams(_) => error_codes::INVALID_PARAMS,
            ActionError::Host(_) | ActionError::Failed(_) => error_codes::INTERNAL_ERROR,
        }
    }
}

impl From<serde_json::Error> for ActionError {
    fn from(e: serde_json::Error) -> Self {
        ActionError::InvalidParams(e.to_string())
    }
}

/// Result returned by action handlers.
pub type ActionResult = Result<serde_json::Value, ActionError>;

/// Router error type.
#[derive(Error, Debug)]
pub enum RouterError {
    /// No handler registered under this name
    #[error("No handler for action: {0}")]
    HandlerNotFound(String),

    /// Handler ran in-process and failed
    #[error("Action {action} failed: {message}")]
    ActionFailed {
        action: String,
        message: String,
        code: i32,
    },

    /// Executor answered with an error
    #[error("Remote call to {action} failed: {message}")]
    Remote {
        action: String,
        message: String,
        code: Option<i32>,
    },

    /// No matching response before the deadline
    #[error("Call to {action} ({request_id}) timed out after {after:?}")]
    Timeout {
        action: String,
        request_id: String,
        after: Duration,
    },

    /// Caller aborted the call
    #[error("Call to {action} ({request_id}) was cancelled")]
    Cancelled { action: String, request_id: String },

    /// Router stopped while the call was outstanding
    #[error("Router is shutting down")]
    ShuttingDown,

    /// Transport could not publish a message
    #[error("Transport error: {0}")]
    Transport(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RouterError {
    /// True when the action has no handler, locally or on the executor.
    pub fn is_handler_not_found(&self) -> bool {
        match self {
            RouterError::HandlerNotFound(_) => true,
            RouterError::Remote { code, .. } => *code == Some(error_codes::METHOD_NOT_FOUND),
            _ => false,
        }
    }

    /// Name of the action the error relates to, if any.
    pub fn action(&self) -> Option<&str> {
        match self {
            RouterError::HandlerNotFound(action)
            | RouterError::ActionFailed { action, .. }
            | RouterError::Remote { action, .. }
            | RouterError::Timeout { action, .. }
            | RouterError::Cancelled { action, .. } => Some(action),
            RouterError::ShuttingDown | RouterError::Transport(_) | RouterError::Json(_) => None,
        }
    }
}

/// Result type alias using RouterError.
pub type RouterResult<T> = Result<T, RouterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_error_codes() {
        assert_eq!(
            ActionError::InvalidParams("x".into()).code(),
            error_codes::INVALID_PARAMS
        );
        assert_eq!(ActionError::Host("x".into()).code(), error_codes::INTERNAL_ERROR);
        assert_eq!(ActionError::Failed("x".into()).code(), error_codes::INTERNAL_ERROR);
    }

    #[test]
    fn test_action_error_message_is_never_empty() {
        assert!(!ActionError::Failed(String::new()).to_string().is_empty());
    }

    #[test]
    fn test_handler_not_found_detection() {
        assert!(RouterError::HandlerNotFound("x".into()).is_handler_not_found());
        assert!(RouterError::Remote {
            action: "x".into(),
            message: "No handler for action: x".into(),
            code: Some(error_codes::METHOD_NOT_FOUND),
        }
        .is_handler_not_found());
        assert!(!RouterError::Remote {
            action: "x".into(),
            message: "boom".into(),
            code: Some(error_codes::INTERNAL_ERROR),
        }
        .is_handler_not_found());
        assert!(!RouterError::ShuttingDown.is_handler_not_found());
    }

    #[test]
    fn test_serialization_errors_convert_to_json() {
        fn parse(raw: &str) -> RouterResult<serde_json::Value> {
            Ok(serde_json::from_str(raw)?)
        }

        let err = parse("{not json").unwrap_err();
        assert!(matches!(err, RouterError::Json(_)));
        assert_eq!(err.action(), None);
    }

    #[test]
    fn test_error_messages_reference_action() {
        let err = RouterError::Remote {
            action: "castSpell".into(),
            message: "boom".into(),
            code: None,
        };
        assert!(err.to_string().contains("castSpell"));
        assert_eq!(err.action(), Some("castSpell"));

        let err = RouterError::Timeout {
            action: "rollInitiative".into(),
            request_id: "r1".into(),
            after: Duration::from_millis(50),
        };
        assert!(err.to_string().contains("rollInitiative"));
        assert!(err.to_string().contains("r1"));
    }
}
