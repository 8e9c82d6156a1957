//! Business action handlers, grouped by area.
//!
//! Every handler takes the positional call arguments, reads its payload
//! from `args[0]`, and answers with a JSON object. Entities that cannot be
//! found and host state that is missing are answered as data
//! (`"success": false`), never as errors.

pub mod character;
pub mod chat;
pub mod combat;
pub mod inventory;
pub mod npc;
pub mod quests;
pub mod rest;
pub mod session;
pub mod spells;
pub mod tables;

use crate::{DiceRoller, Entity, EntityKind, HostResult, HostStore};
use relay_router::{ActionError, ActionRegistry, ActionResult};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct ActionContext {
    pub host: Arc<dyn HostStore>,
    pub dice: Arc<dyn DiceRoller>,
}

impl ActionContext {
    pub fn new(host: Arc<dyn HostStore>, dice: Arc<dyn DiceRoller>) -> Self {
        Self { host, dice }
    }

    /// Look up an actor by ID.
    pub async fn actor(&self, id: &str) -> HostResult<Option<Entity>> {
        Ok(self
            .host
            .lookup_entity(id)
            .await?
            .filter(|e| e.kind == EntityKind::Actor))
    }

    /// Look up an item owned by `actor_id`.
    pub async fn owned_item(&self, actor_id: &str, item_id: &str) -> HostResult<Option<Entity>> {
        Ok(self
            .host
            .lookup_entity(item_id)
            .await?
            .filter(|e| e.kind == EntityKind::Item && e.parent.as_deref() == Some(actor_id)))
    }

    /// The combat currently running, if any.
    pub async fn active_combat(&self) -> HostResult<Option<Entity>> {
        Ok(self
            .host
            .list_entities(EntityKind::Combat)
            .await?
            .into_iter()
            .find(Entity::is_active_combat))
    }
}

/// Register every business action.
pub async fn register_all(registry: &ActionRegistry, ctx: ActionContext) {
    character::register(registry, &ctx).await;
    inventory::register(registry, &ctx).await;
    combat::register(registry, &ctx).await;
    tables::register(registry, &ctx).await;
    chat::register(registry, &ctx).await;
    spells::register(registry, &ctx).await;
    quests::register(registry, &ctx).await;
    npc::register(registry, &ctx).await;
    rest::register(registry, &ctx).await;
    session::register(registry, &ctx).await;

    info!(actions = registry.len().await, "All business actions registered");
}

/// Register one handler, giving it its own clone of the context per call.
pub(crate) async fn bind<F, Fut>(
    registry: &ActionRegistry,
    ctx: &ActionContext,
    name: &str,
    handler: F,
) where
    F: Fn(ActionContext, Vec<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ActionResult> + Send + 'static,
{
    let ctx = ctx.clone();
    registry
        .register(name, move |args| handler(ctx.clone(), args))
        .await;
}

/// Decode the payload object in `args[0]`. A missing payload decodes as `{}`.
pub(crate) fn payload<T: DeserializeOwned>(args: &[Value]) -> Result<T, ActionError> {
    let value = match args.first() {
        Some(Value::Null) | None => Value::Object(Map::new()),
        Some(value) => value.clone(),
    };
    Ok(serde_json::from_value(value)?)
}

/// Successful result: the given fields plus `"success": true`.
pub(crate) fn ok(fields: Value) -> ActionResult {
    let mut fields = match fields {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
    };
    fields.insert("success".to_string(), Value::Bool(true));
    Ok(Value::Object(fields))
}

/// Lookup miss, reported as data.
pub(crate) fn not_found(what: &str, id: &str) -> ActionResult {
    let message = format!("{} with ID {} not found", what, id);
    debug!(%message, "Lookup failed");
    Ok(json!({
        "success": false,
        "error": "not_found",
        "message": message,
    }))
}

/// Host state the action needs is absent (e.g. no active combat).
pub(crate) fn unavailable(message: &str) -> ActionResult {
    debug!(%message, "Action unavailable");
    Ok(json!({
        "success": false,
        "error": "unavailable",
        "message": message,
    }))
}

/// Current and maximum hit points of an actor.
pub(crate) fn hit_points(actor: &Entity) -> (i64, i64) {
    let value = actor.system_i64("attributes.hp.value").unwrap_or(0);
    let max = actor.system_i64("attributes.hp.max").unwrap_or(value);
    (value, max)
}

/// Item description text, or a placeholder.
pub(crate) fn description(item: &Entity) -> String {
    item.system_str("description.value")
        .filter(|d| !d.is_empty())
        .unwrap_or("No description available")
        .to_string()
}


#[cfg(test)]
mod tests {
    use super::testing::{context, host};
    use super::*;

    #[test]
    fn test_payload_defaults_to_empty_object() {
        #[derive(serde::Deserialize)]
        struct Empty {}
        assert!(payload::<Empty>(&[]).is_ok());
        assert!(payload::<Empty>(&[Value::Null]).is_ok());
    }

    #[test]
    fn test_payload_errors_are_invalid_params() {
        #[derive(Debug, serde::Deserialize)]
        #[allow(dead_code)]
        struct NeedsId {
            id: String,
        }
        let err = payload::<NeedsId>(&[json!({})]).unwrap_err();
        assert!(matches!(err, ActionError::InvalidParams(_)));
    }

    #[test]
    fn test_result_shapes() {
        assert_eq!(
            ok(json!({"newHP": 3})).unwrap(),
            json!({"newHP": 3, "success": true})
        );
        let miss = not_found("Actor", "x").unwrap();
        assert_eq!(miss["error"], "not_found");
        assert_eq!(miss["success"], false);
        assert!(miss["message"].as_str().unwrap().contains("x"));
        assert_eq!(unavailable("No active combat").unwrap()["error"], "unavailable");
    }

    #[tokio::test]
    async fn test_context_lookups() {
        let host = host();
        let ctx = context(&host, 10);

        assert!(ctx.actor("a1").await.unwrap().is_some());
        assert!(ctx.actor("i1").await.unwrap().is_none());
        assert!(ctx.owned_item("a1", "i1").await.unwrap().is_some());
        assert!(ctx.owned_item("a2", "i1").await.unwrap().is_none());
        assert_eq!(ctx.active_combat().await.unwrap().unwrap().id, "c1");
    }

    #[tokio::test]
    async fn test_register_all() {
        let host = host();
        let registry = ActionRegistry::new();
        register_all(&registry, context(&host, 10)).await;

        let names = registry.names().await;
        assert_eq!(names.len(), 31);
        for name in [
            "getActor",
            "getCharacterStats",
            "applyDamageOrHealing",
            "relayRPCommand",
            "logSessionNotes",
        ] {
            assert!(names.iter().any(|n| n == name), "{} missing", name);
        }
    }
}
