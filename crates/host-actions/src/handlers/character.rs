//! Character sheet actions.

use super::{bind, hit_points, not_found, ok, payload, ActionContext};
use crate::entity::patch_at;
use crate::EntityKind;
use relay_router::{ActionRegistry, ActionResult};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::info;

const ABILITIES: [&str; 6] = ["str", "dex", "con", "int", "wis", "cha"];

pub async fn register(registry: &ActionRegistry, ctx: &ActionContext) {
    bind(registry, ctx, "getActor", get_actor).await;
    bind(registry, ctx, "getCharacterStats", get_character_stats).await;
    bind(registry, ctx, "updateCharacterHP", update_character_hp).await;
    bind(registry, ctx, "updateCharacterCondition", update_character_condition).await;
    bind(registry, ctx, "updateResource", update_resource).await;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActorParams {
    actor_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HpParams {
    actor_id: String,
    hp_change: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConditionParams {
    actor_id: String,
    condition: String,
    #[serde(default = "default_add")]
    add: bool,
}

fn default_add() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceParams {
    actor_id: String,
    resource_name: String,
    value: Value,
}

async fn get_actor(ctx: ActionContext, args: Vec<Value>) -> ActionResult {
    let params: ActorParams = payload(&args)?;
    let Some(actor) = ctx.actor(&params.actor_id).await? else {
        return not_found("Actor", &params.actor_id);
    };
    ok(json!({ "actorData": actor }))
}

async fn get_character_stats(ctx: ActionContext, args: Vec<Value>) -> ActionResult {
    let params: ActorParams = payload(&args)?;
    let Some(actor) = ctx.actor(&params.actor_id).await? else {
        return not_found("Actor", &params.actor_id);
    };

    let (hp, max) = hit_points(&actor);
    let abilities: Map<String, Value> = ABILITIES
        .iter()
        .filter_map(|key| {
            actor
                .system_i64(&format!("abilities.{}.value", key))
                .map(|score| (key.to_string(), json!(score)))
        })
        .collect();

    ok(json!({
        "name": actor.name,
        "hp": { "value": hp, "max": max },
        "ac": actor.system_i64("attributes.ac.value"),
        "abilities": abilities,
    }))
}

async fn update_character_hp(ctx: ActionContext, args: Vec<Value>) -> ActionResult {
    let params: HpParams = payload(&args)?;
    let Some(actor) = ctx.actor(&params.actor_id).await? else {
        return not_found("Actor", &params.actor_id);
    };

    let (hp, _) = hit_points(&actor);
    let new_hp = hp.saturating_add(params.hp_change).max(0);
    ctx.host
        .update_entity(&actor.id, patch_at("system.attributes.hp.value", json!(new_hp)))
        .await?;

    info!(actor_id = %actor.id, old_hp = hp, new_hp, "Hit points updated");
    ok(json!({ "actorName": actor.name, "newHP": new_hp }))
}

async fn update_character_condition(ctx: ActionContext, args: Vec<Value>) -> ActionResult {
    let params: ConditionParams = payload(&args)?;
    let Some(actor) = ctx.actor(&params.actor_id).await? else {
        return not_found("Actor", &params.actor_id);
    };

    let existing: Vec<_> = ctx
        .host
        .embedded(&actor.id, EntityKind::Effect)
        .await?
        .into_iter()
        .filter(|effect| effect.name.eq_ignore_ascii_case(&params.condition))
        .collect();

    let status = match (params.add, existing.is_empty()) {
        (true, true) => {
            ctx.host
                .create_embedded(&actor.id, EntityKind::Effect, vec![json!({ "name": params.condition })])
                .await?;
            "added"
        }
        (false, false) => {
            for effect in &existing {
                ctx.host.delete_embedded(&effect.id).await?;
            }
            "removed"
        }
        _ => "unchanged",
    };

    info!(actor_id = %actor.id, condition = %params.condition, status, "Condition updated");
    ok(json!({
        "actorName": actor.name,
        "condition": params.condition,
        "status": status,
    }))
}

async fn update_resource(ctx: ActionContext, args: Vec<Value>) -> ActionResult {
    let params: ResourceParams = payload(&args)?;
    let Some(actor) = ctx.actor(&params.actor_id).await? else {
        return not_found("Actor", &params.actor_id);
    };

    let path = format!("resources.{}", params.resource_name);
    if actor.system_at(&path).is_none() {
        return not_found("Resource", &params.resource_name);
    }

    ctx.host
        .update_entity(
            &actor.id,
            patch_at(&format!("system.{}.value", path), params.value.clone()),
        )
        .await?;

    ok(json!({
        "resourceName": params.resource_name,
        "newValue": params.value,
    }))
}
