//! The host collaborator: the runtime that owns all game state.

use crate::{Entity, EntityKind, HostResult};
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

/// Something that happened inside the host, observed after the fact.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// A top-level entity changed (actors, combats, journals).
    EntityUpdated(Entity),
    /// An embedded document was created on its parent.
    EmbeddedCreated(Entity),
    /// An embedded document was deleted from its parent.
    EmbeddedDeleted(Entity),
    /// The active combat moved to another combatant.
    CombatTurn { combat: Entity, combatant: Entity },
    /// A chat message was posted.
    ChatMessage {
        speaker: Option<String>,
        content: String,
    },
    /// An actor used one of its items.
    ItemUsed { actor: Entity, item: Entity },
    /// An actor finished resting.
    RestCompleted { actor: Entity, long_rest: bool },
}

/// Read/write access to host entities.
///
/// Every mutation is reported on the event stream returned by
/// [`subscribe_events`](HostStore::subscribe_events).
#[async_trait]
pub trait HostStore: Send + Sync {
    async fn lookup_entity(&self, id: &str) -> HostResult<Option<Entity>>;

    /// Top-level entities of one kind, in host order.
    async fn list_entities(&self, kind: EntityKind) -> HostResult<Vec<Entity>>;

    /// Documents of one kind embedded in `parent_id`, in host order.
    async fn embedded(&self, parent_id: &str, kind: EntityKind) -> HostResult<Vec<Entity>>;

    /// Deep-merge a partial entity (`name`, `system`, `flags`) and return the
    /// updated entity.
    async fn update_entity(&self, id: &str, patch: Value) -> HostResult<Entity>;

    /// Create documents under `parent_id` from partial entity data.
    async fn create_embedded(
        &self,
        parent_id: &str,
        kind: EntityKind,
        data: Vec<Value>,
    ) -> HostResult<Vec<Entity>>;

    async fn delete_embedded(&self, id: &str) -> HostResult<Entity>;

    async fn create_chat_message(&self, speaker: Option<&str>, content: &str) -> HostResult<()>;

    /// Record that `actor_id` used `item_id`.
    async fn use_item(&self, actor_id: &str, item_id: &str) -> HostResult<()>;

    /// Record that `actor_id` finished a rest.
    async fn complete_rest(&self, actor_id: &str, long_rest: bool) -> HostResult<()>;

    /// True when this process is the game master's and may mutate state.
    fn is_privileged_executor(&self) -> bool;

    fn subscribe_events(&self) -> broadcast::Receiver<HostEvent>;
}
