//! Fire-and-forget notifications describing host state changes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kinds of host notifications pushed to the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationKind {
    ActorUpdated,
    ItemAdded,
    ItemRemoved,
    CombatUpdated,
    TurnNotification,
    ChatRelayToDiscord,
    SpellUsed,
    AbilityUsed,
    LongRest,
    ShortRest,
}

/// A notification frame: `{"action": <kind>, ...fields}`.
///
/// Carries no `type` field, so routers never mistake it for an envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub action: NotificationKind,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Notification {
    /// Build a notification from a JSON object of fields.
    ///
    /// Non-object values are dropped.
    pub fn new(action: NotificationKind, fields: Value) -> Self {
        let fields = match fields {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self { action, fields }
    }

    /// Serialize to a JSON value for the transport.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}
