//! Host-managed entities.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Collection an entity belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Actor,
    Item,
    Effect,
    Journal,
    Table,
    Combat,
}

/// A document owned by the host, addressed by ID.
///
/// `system` holds the game-system data (hit points, abilities, item
/// quantities); the relay reads and patches it by path and otherwise treats
/// it as opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub kind: EntityKind,
    pub name: String,
    /// Sub-type within the kind: `character`/`npc` for actors,
    /// `spell`/`feat`/`weapon`/... for items.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(default)]
    pub system: Value,
    #[serde(default)]
    pub flags: Map<String, Value>,
    /// Owning entity for embedded documents (items and effects on an actor).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

impl Entity {
    pub fn new(id: &str, kind: EntityKind, name: &str) -> Self {
        Self {
            id: id.to_string(),
            kind,
            name: name.to_string(),
            subtype: None,
            system: Value::Object(Map::new()),
            flags: Map::new(),
            parent: None,
        }
    }

    pub fn with_subtype(mut self, subtype: &str) -> Self {
        self.subtype = Some(subtype.to_string());
        self
    }

    pub fn with_system(mut self, system: Value) -> Self {
        self.system = system;
        self
    }

    pub fn with_parent(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    pub fn with_flag(mut self, key: &str, value: Value) -> Self {
        self.flags.insert(key.to_string(), value);
        self
    }

    pub fn is_subtype(&self, subtype: &str) -> bool {
        self.subtype.as_deref() == Some(subtype)
    }

    /// Value in `system` at a dotted path, e.g. `attributes.hp.value`.
    pub fn system_at(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(&self.system, |value, key| value.get(key))
    }

    pub fn system_i64(&self, path: &str) -> Option<i64> {
        self.system_at(path).and_then(Value::as_i64)
    }

    pub fn system_str(&self, path: &str) -> Option<&str> {
        self.system_at(path).and_then(Value::as_str)
    }

    pub fn flag(&self, key: &str) -> Option<&Value> {
        self.flags.get(key)
    }

    /// Combatants of a combat entity, in turn order. Malformed entries are
    /// skipped.
    pub fn combatants(&self) -> Vec<Combatant> {
        self.system
            .get("combatants")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|c| serde_json::from_value(c.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Combatant whose turn it is.
    pub fn current_combatant(&self) -> Option<Combatant> {
        let turn = self.system_i64("turn").unwrap_or(0);
        let turn = usize::try_from(turn).ok()?;
        self.combatants().into_iter().nth(turn)
    }

    pub fn is_active_combat(&self) -> bool {
        self.kind == EntityKind::Combat
            && self.system.get("active").and_then(Value::as_bool) == Some(true)
    }
}

/// One participant of a combat, stored in the combat's `system.combatants`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Combatant {
    pub actor_id: String,
    #[serde(default)]
    pub initiative: Option<i64>,
}

/// Build a nested patch object from a dotted path.
///
/// `patch_at("system.attributes.hp.value", json!(7))` yields
/// `{"system":{"attributes":{"hp":{"value":7}}}}`.
pub fn patch_at(path: &str, value: Value) -> Value {
    path.rsplit('.').fold(value, |inner, key| {
        let mut map = Map::new();
        map.insert(key.to_string(), inner);
        Value::Object(map)
    })
}

/// Deep-merge `patch` into `target`. Objects merge key by key, anything else
/// replaces.
pub fn merge(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                merge(target.entry(key).or_insert(Value::Null), value);
            }
        }
        (target, patch) => *target = patch,
    }
}
