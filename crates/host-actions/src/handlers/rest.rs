//! Long and short rests.

use super::{bind, hit_points, not_found, ok, payload, ActionContext};
use crate::Entity;
use relay_router::{ActionRegistry, ActionResult};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::info;

pub async fn register(registry: &ActionRegistry, ctx: &ActionContext) {
    bind(registry, ctx, "longRest", long_rest).await;
    bind(registry, ctx, "shortRest", short_rest).await;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RestParams {
    character_id: String,
}

/// `{key: {"value": max}}` for every entry of `system.<section>` that has a
/// `max` and passes `filter`.
fn refill(actor: &Entity, section: &str, filter: impl Fn(&Value) -> bool) -> Map<String, Value> {
    actor
        .system_at(section)
        .and_then(Value::as_object)
        .map(|entries| {
            entries
                .iter()
                .filter(|&(_, entry)| filter(entry))
                .filter_map(|(key, entry)| {
                    let max = entry.get("max")?.as_i64()?;
                    Some((key.clone(), json!({ "value": max })))
                })
                .collect()
        })
        .unwrap_or_default()
}

async fn long_rest(ctx: ActionContext, args: Vec<Value>) -> ActionResult {
    let params: RestParams = payload(&args)?;
    let Some(character) = ctx.actor(&params.character_id).await? else {
        return not_found("Character", &params.character_id);
    };

    let (_, max) = hit_points(&character);
    let patch = json!({
        "system": {
            "attributes": { "hp": { "value": max } },
            "resources": refill(&character, "resources", |_| true),
            "spells": refill(&character, "spells", |_| true),
        }
    });
    ctx.host.update_entity(&character.id, patch).await?;
    ctx.host.complete_rest(&character.id, true).await?;

    info!(actor_id = %character.id, hp = max, "Long rest completed");
    ok(json!({
        "actorName": character.name,
        "restSummary": format!(
            "**{} has completed a Long Rest**\nHP fully restored to {}/{}\nAll spell slots and abilities are refreshed.",
            character.name, max, max
        ),
    }))
}

async fn short_rest(ctx: ActionContext, args: Vec<Value>) -> ActionResult {
    let params: RestParams = payload(&args)?;
    let Some(character) = ctx.actor(&params.character_id).await? else {
        return not_found("Character", &params.character_id);
    };

    let restored = refill(&character, "resources", |entry| {
        entry.get("sr").and_then(Value::as_bool) == Some(true)
    });
    let count = restored.len();
    if !restored.is_empty() {
        ctx.host
            .update_entity(&character.id, json!({ "system": { "resources": restored } }))
            .await?;
    }
    ctx.host.complete_rest(&character.id, false).await?;

    info!(actor_id = %character.id, restored = count, "Short rest completed");
    ok(json!({
        "actorName": character.name,
        "restSummary": format!(
            "**{} has completed a Short Rest**\n{} short-rest resource(s) recovered.",
            character.name, count
        ),
    }))
}
