//! Framing used between peers and the broadcast hub.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One NDJSON line on the hub socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubFrame {
    /// Topic the message is published on.
    pub channel: String,
    /// Opaque payload, an envelope or a notification.
    pub message: Value,
}

impl HubFrame {
    pub fn new(channel: &str, message: Value) -> Self {
        Self {
            channel: channel.to_string(),
            message,
        }
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_frame_json_shape() {
        let frame = HubFrame::new("module.test", json!({"type": "REQUEST"}));
        let json = frame.to_json().unwrap();

        assert!(json.contains("\"channel\":\"module.test\""));
        assert!(json.contains("\"message\":{\"type\":\"REQUEST\"}"));
        assert!(!json.contains('\n'));
    }

    #[test]
    fn test_frame_missing_channel_is_rejected() {
        assert!(HubFrame::from_json(r#"{"message":{}}"#).is_err());
        assert!(HubFrame::from_json("not json").is_err());
    }
}
