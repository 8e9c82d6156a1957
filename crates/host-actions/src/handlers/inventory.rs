//! Inventory and spellbook actions.

use super::{bind, description, not_found, ok, payload, ActionContext};
use crate::{Entity, EntityKind};
use relay_router::{ActionRegistry, ActionResult};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

/// Item types listed as inventory.
const INVENTORY_TYPES: [&str; 3] = ["loot", "equipment", "weapon"];

pub async fn register(registry: &ActionRegistry, ctx: &ActionContext) {
    bind(registry, ctx, "getCharacterInventory", get_character_inventory).await;
    bind(registry, ctx, "getCharacterSpells", get_character_spells).await;
    bind(registry, ctx, "addItemToInventory", add_item_to_inventory).await;
    bind(registry, ctx, "removeItemFromInventory", remove_item_from_inventory).await;
    bind(registry, ctx, "getItemDetails", get_item_details).await;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActorParams {
    actor_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddItemParams {
    actor_id: String,
    item_data: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemParams {
    actor_id: String,
    item_id: String,
}

async fn items_of(ctx: &ActionContext, actor: &Entity) -> crate::HostResult<Vec<Entity>> {
    ctx.host.embedded(&actor.id, EntityKind::Item).await
}

async fn get_character_inventory(ctx: ActionContext, args: Vec<Value>) -> ActionResult {
    let params: ActorParams = payload(&args)?;
    let Some(actor) = ctx.actor(&params.actor_id).await? else {
        return not_found("Actor", &params.actor_id);
    };

    let inventory: Vec<Value> = items_of(&ctx, &actor)
        .await?
        .iter()
        .filter(|item| INVENTORY_TYPES.iter().any(|t| item.is_subtype(t)))
        .map(|item| {
            json!({
                "id": item.id,
                "name": item.name,
                "quantity": item.system_i64("quantity").unwrap_or(1),
                "equipped": item.system_at("equipped").and_then(Value::as_bool).unwrap_or(false),
            })
        })
        .collect();

    ok(json!({ "actorName": actor.name, "inventory": inventory }))
}

async fn get_character_spells(ctx: ActionContext, args: Vec<Value>) -> ActionResult {
    let params: ActorParams = payload(&args)?;
    let Some(actor) = ctx.actor(&params.actor_id).await? else {
        return not_found("Actor", &params.actor_id);
    };

    let spells: Vec<Value> = items_of(&ctx, &actor)
        .await?
        .iter()
        .filter(|item| item.is_subtype("spell"))
        .map(|spell| {
            json!({
                "id": spell.id,
                "name": spell.name,
                "level": spell.system_i64("level").unwrap_or(0),
                "description": description(spell),
                "uses": spell.system_at("uses").cloned().unwrap_or(Value::Null),
            })
        })
        .collect();

    ok(json!({ "actorName": actor.name, "spells": spells }))
}

async fn add_item_to_inventory(ctx: ActionContext, args: Vec<Value>) -> ActionResult {
    let params: AddItemParams = payload(&args)?;
    let Some(actor) = ctx.actor(&params.actor_id).await? else {
        return not_found("Actor", &params.actor_id);
    };

    let created = ctx
        .host
        .create_embedded(&actor.id, EntityKind::Item, vec![params.item_data])
        .await?;
    let Some(item) = created.into_iter().next() else {
        return Err(relay_router::ActionError::Failed(
            "host created no item".to_string(),
        ));
    };

    info!(actor_id = %actor.id, item_id = %item.id, item = %item.name, "Item added");
    ok(json!({ "itemId": item.id, "itemName": item.name }))
}

async fn remove_item_from_inventory(ctx: ActionContext, args: Vec<Value>) -> ActionResult {
    let params: ItemParams = payload(&args)?;
    let Some(actor) = ctx.actor(&params.actor_id).await? else {
        return not_found("Actor", &params.actor_id);
    };
    let Some(item) = ctx.owned_item(&actor.id, &params.item_id).await? else {
        return not_found("Item", &params.item_id);
    };

    ctx.host.delete_embedded(&item.id).await?;

    info!(actor_id = %actor.id, item_id = %item.id, item = %item.name, "Item removed");
    ok(json!({ "itemId": item.id, "itemName": item.name }))
}

async fn get_item_details(ctx: ActionContext, args: Vec<Value>) -> ActionResult {
    let params: ItemParams = payload(&args)?;
    let Some(actor) = ctx.actor(&params.actor_id).await? else {
        return not_found("Actor", &params.actor_id);
    };
    let Some(item) = ctx.owned_item(&actor.id, &params.item_id).await? else {
        return not_found("Item", &params.item_id);
    };

    let effects: Vec<String> = ctx
        .host
        .embedded(&item.id, EntityKind::Effect)
        .await?
        .into_iter()
        .map(|effect| effect.name)
        .collect();

    ok(json!({
        "itemDetails": {
            "name": item.name,
            "type": item.subtype,
            "description": description(&item),
            "quantity": item.system_i64("quantity").unwrap_or(1),
            "weight": item.system_at("weight").cloned().unwrap_or(json!(0)),
            "effects": effects,
        }
    }))
}
