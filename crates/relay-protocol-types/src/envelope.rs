//! Request/response envelopes for correlated calls over the broadcast channel.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role a request is addressed to. Only a peer holding this role executes it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recipient {
    /// The privileged executor of the session.
    #[default]
    #[serde(rename = "GM")]
    Gm,
}

/// A call envelope, discriminated by its `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Envelope {
    #[serde(rename = "REQUEST")]
    Request(Request),
    /// Older peers tag responses as `RESULT`; both decode here.
    #[serde(rename = "RESPONSE", alias = "RESULT")]
    Response(Response),
}

impl Envelope {
    /// Serialize to a JSON value for the transport.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Decode a JSON value received from the transport.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Correlation ID carried by either kind.
    pub fn id(&self) -> &str {
        match self {
            Envelope::Request(req) => &req.id,
            Envelope::Response(resp) => &resp.id,
        }
    }
}

/// Outbound call, broadcast to every peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// Request ID for correlation.
    pub id: String,
    /// Registered action to invoke.
    pub function_name: String,
    /// Positional arguments.
    #[serde(default)]
    pub args: Vec<Value>,
    /// Role expected to execute the call.
    #[serde(default)]
    pub recipient: Recipient,
}

impl Request {
    /// Create a request with a fresh UUID, addressed to the GM.
    pub fn new(function_name: &str, args: Vec<Value>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            function_name: function_name.to_string(),
            args,
            recipient: Recipient::Gm,
        }
    }

    /// Wrap into an envelope.
    pub fn into_envelope(self) -> Envelope {
        Envelope::Request(self)
    }
}

/// Reply to a [`Request`], carrying the same ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// ID of the originating request.
    #[serde(alias = "requestId")]
    pub id: String,
    /// Result data (if successful).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error description (if failed).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Machine-readable error code, see [`error_codes`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i32>,
}

impl Response {
    /// Create a successful response.
    pub fn success(id: &str, result: Value) -> Self {
        Self {
            id: id.to_string(),
            result: Some(result),
            error: None,
            code: None,
        }
    }

    /// Create an error response.
    pub fn error(id: &str, code: i32, message: &str) -> Self {
        Self {
            id: id.to_string(),
            result: None,
            error: Some(message.to_string()),
            code: Some(code),
        }
    }

    /// Check if the response is successful.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Wrap into an envelope.
    pub fn into_envelope(self) -> Envelope {
        Envelope::Response(self)
    }
}

// JSON-RPC style error codes
pub mod error_codes {
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}
