//! In-memory host backed by a JSON world file.

use crate::entity::merge;
use crate::{Entity, EntityKind, HostError, HostEvent, HostResult, HostStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use relay_router::ExecutorRole;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

const EVENT_BUFFER: usize = 256;

/// Contents of a world file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct World {
    /// Whether this process acts as the game master.
    #[serde(default = "default_privileged")]
    pub privileged: bool,
    #[serde(default)]
    pub entities: Vec<Entity>,
}

fn default_privileged() -> bool {
    true
}

impl Default for World {
    fn default() -> Self {
        Self {
            privileged: default_privileged(),
            entities: Vec::new(),
        }
    }
}

/// A chat message posted through the host.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatEntry {
    pub speaker: Option<String>,
    pub content: String,
    pub posted_at: DateTime<Utc>,
}

/// Host keeping every entity in memory, in world-file order.
pub struct MemoryHost {
    entities: Mutex<Vec<Entity>>,
    chat_log: Mutex<Vec<ChatEntry>>,
    privileged: AtomicBool,
    events: broadcast::Sender<HostEvent>,
}

impl MemoryHost {
    pub fn new(world: World) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            entities: Mutex::new(world.entities),
            chat_log: Mutex::new(Vec::new()),
            privileged: AtomicBool::new(world.privileged),
            events,
        }
    }

    /// Load a world file.
    pub fn load(path: &Path) -> HostResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let host = Self::from_json(&content)?;
        info!(
            path = %path.display(),
            entities = host.entities.lock().len(),
            "Loaded world"
        );
        Ok(host)
    }

    pub fn from_json(json: &str) -> HostResult<Self> {
        let world: World = serde_json::from_str(json)?;
        Ok(Self::new(world))
    }

    /// Current state as a world file.
    pub fn snapshot(&self) -> World {
        World {
            privileged: self.privileged.load(Ordering::SeqCst),
            entities: self.entities.lock().clone(),
        }
    }

    pub fn set_privileged(&self, privileged: bool) {
        self.privileged.store(privileged, Ordering::SeqCst);
    }

    /// Chat messages posted so far, oldest first.
    pub fn chat_log(&self) -> Vec<ChatEntry> {
        self.chat_log.lock().clone()
    }

    fn find(&self, id: &str) -> Option<Entity> {
        self.entities.lock().iter().find(|e| e.id == id).cloned()
    }

    fn emit(&self, event: HostEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn build_embedded(parent_id: &str, kind: EntityKind, data: Value) -> HostResult<Entity> {
        let mut fields = match data {
            Value::Object(fields) => fields,
            other => {
                return Err(HostError::InvalidData(format!(
                    "expected an object, got {}",
                    other
                )))
            }
        };

        fields
            .entry("id")
            .or_insert_with(|| Value::String(new_entity_id()));
        fields.insert("kind".to_string(), serde_json::to_value(kind)?);
        fields.insert("parent".to_string(), Value::String(parent_id.to_string()));

        serde_json::from_value(Value::Object(fields))
            .map_err(|e| HostError::InvalidData(e.to_string()))
    }
}

/// Fresh 16-character entity ID.
fn new_entity_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..16].to_string()
}

#[async_trait]
impl HostStore for MemoryHost {
    async fn lookup_entity(&self, id: &str) -> HostResult<Option<Entity>> {
        Ok(self.find(id))
    }

    async fn list_entities(&self, kind: EntityKind) -> HostResult<Vec<Entity>> {
        Ok(self
            .entities
            .lock()
            .iter()
            .filter(|e| e.kind == kind && e.parent.is_none())
            .cloned()
            .collect())
    }

    async fn embedded(&self, parent_id: &str, kind: EntityKind) -> HostResult<Vec<Entity>> {
        Ok(self
            .entities
            .lock()
            .iter()
            .filter(|e| e.kind == kind && e.parent.as_deref() == Some(parent_id))
            .cloned()
            .collect())
    }

    async fn update_entity(&self, id: &str, patch: Value) -> HostResult<Entity> {
        if !patch.is_object() {
            return Err(HostError::InvalidData("patch must be an object".to_string()));
        }

        let (updated, turn_changed) = {
            let mut entities = self.entities.lock();
            let entity = entities
                .iter_mut()
                .find(|e| e.id == id)
                .ok_or_else(|| HostError::NotFound(id.to_string()))?;

            let mut doc = serde_json::to_value(&*entity)?;
            merge(&mut doc, patch);
            let updated: Entity =
                serde_json::from_value(doc).map_err(|e| HostError::InvalidData(e.to_string()))?;

            if updated.id != entity.id || updated.kind != entity.kind || updated.parent != entity.parent
            {
                return Err(HostError::InvalidData(
                    "id, kind and parent cannot be changed".to_string(),
                ));
            }

            let turn_changed = entity.kind == EntityKind::Combat
                && entity.system.get("turn") != updated.system.get("turn");
            *entity = updated.clone();
            (updated, turn_changed)
        };

        debug!(entity_id = %id, kind = ?updated.kind, "Entity updated");
        self.emit(HostEvent::EntityUpdated(updated.clone()));

        if turn_changed {
            if let Some(combatant) = updated.current_combatant() {
                match self.find(&combatant.actor_id) {
                    Some(actor) => self.emit(HostEvent::CombatTurn {
                        combat: updated.clone(),
                        combatant: actor,
                    }),
                    None => warn!(actor_id = %combatant.actor_id, "Combatant has no actor"),
                }
            }
        }

        Ok(updated)
    }

    async fn create_embedded(
        &self,
        parent_id: &str,
        kind: EntityKind,
        data: Vec<Value>,
    ) -> HostResult<Vec<Entity>> {
        if self.find(parent_id).is_none() {
            return Err(HostError::NotFound(parent_id.to_string()));
        }

        let created = data
            .into_iter()
            .map(|d| Self::build_embedded(parent_id, kind, d))
            .collect::<HostResult<Vec<Entity>>>()?;

        {
            let mut entities = self.entities.lock();
            if let Some(dup) = created.iter().find(|c| entities.iter().any(|e| e.id == c.id)) {
                return Err(HostError::InvalidData(format!("duplicate entity ID {}", dup.id)));
            }
            entities.extend(created.iter().cloned());
        }

        for entity in &created {
            debug!(entity_id = %entity.id, parent_id = %parent_id, kind = ?kind, "Embedded entity created");
            self.emit(HostEvent::EmbeddedCreated(entity.clone()));
        }
        Ok(created)
    }

    async fn delete_embedded(&self, id: &str) -> HostResult<Entity> {
        let removed = {
            let mut entities = self.entities.lock();
            let index = entities
                .iter()
                .position(|e| e.id == id)
                .ok_or_else(|| HostError::NotFound(id.to_string()))?;
            if entities[index].parent.is_none() {
                return Err(HostError::InvalidData(format!("{} is not embedded", id)));
            }
            entities.remove(index)
        };

        debug!(entity_id = %id, "Embedded entity deleted");
        self.emit(HostEvent::EmbeddedDeleted(removed.clone()));
        Ok(removed)
    }

    async fn create_chat_message(&self, speaker: Option<&str>, content: &str) -> HostResult<()> {
        self.chat_log.lock().push(ChatEntry {
            speaker: speaker.map(String::from),
            content: content.to_string(),
            posted_at: Utc::now(),
        });

        self.emit(HostEvent::ChatMessage {
            speaker: speaker.map(String::from),
            content: content.to_string(),
        });
        Ok(())
    }

    async fn use_item(&self, actor_id: &str, item_id: &str) -> HostResult<()> {
        let actor = self
            .find(actor_id)
            .ok_or_else(|| HostError::NotFound(actor_id.to_string()))?;
        let item = self
            .find(item_id)
            .filter(|i| i.parent.as_deref() == Some(actor_id))
            .ok_or_else(|| HostError::NotFound(item_id.to_string()))?;

        self.emit(HostEvent::ItemUsed { actor, item });
        Ok(())
    }

    async fn complete_rest(&self, actor_id: &str, long_rest: bool) -> HostResult<()> {
        let actor = self
            .find(actor_id)
            .ok_or_else(|| HostError::NotFound(actor_id.to_string()))?;

        self.emit(HostEvent::RestCompleted { actor, long_rest });
        Ok(())
    }

    fn is_privileged_executor(&self) -> bool {
        self.privileged.load(Ordering::SeqCst)
    }

    fn subscribe_events(&self) -> broadcast::Receiver<HostEvent> {
        self.events.subscribe()
    }
}

impl ExecutorRole for MemoryHost {
    fn is_privileged_executor(&self) -> bool {
        self.privileged.load(Ordering::SeqCst)
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new(World::default())
    }
}
