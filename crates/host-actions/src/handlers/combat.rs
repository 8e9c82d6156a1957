//! Combat and roll actions.

use super::{bind, hit_points, not_found, ok, payload, unavailable, ActionContext};
use crate::dice::ability_modifier;
use crate::entity::patch_at;
use crate::{Combatant, Entity};
use relay_router::{ActionError, ActionRegistry, ActionResult};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

const SAVE_TYPES: [&str; 6] = ["str", "dex", "con", "int", "wis", "cha"];

pub async fn register(registry: &ActionRegistry, ctx: &ActionContext) {
    bind(registry, ctx, "rollInitiative", roll_initiative).await;
    bind(registry, ctx, "turnNotification", turn_notification).await;
    bind(registry, ctx, "combatSummary", combat_summary).await;
    bind(registry, ctx, "rollAttack", roll_attack).await;
    bind(registry, ctx, "rollSavingThrow", roll_saving_throw).await;
    bind(registry, ctx, "applyDamageOrHealing", apply_damage_or_healing).await;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActorParams {
    actor_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttackData {
    attack_formula: String,
    damage_formula: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttackParams {
    actor_id: String,
    attack_data: AttackData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveParams {
    actor_id: String,
    save_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AmountParams {
    actor_id: String,
    amount: i64,
}

const NO_ACTIVE_COMBAT: &str = "No active combat found";

fn modifier(actor: &Entity, ability: &str) -> i64 {
    ability_modifier(
        actor
            .system_i64(&format!("abilities.{}.value", ability))
            .unwrap_or(10),
    )
}

async fn roll_initiative(ctx: ActionContext, args: Vec<Value>) -> ActionResult {
    let params: ActorParams = payload(&args)?;
    let Some(actor) = ctx.actor(&params.actor_id).await? else {
        return not_found("Actor", &params.actor_id);
    };
    let Some(combat) = ctx.active_combat().await? else {
        return unavailable(NO_ACTIVE_COMBAT);
    };

    let initiative = ctx.dice.roll("1d20")?.total.saturating_add(modifier(&actor, "dex"));

    let mut combatants = combat.combatants();
    match combatants.iter_mut().find(|c| c.actor_id == actor.id) {
        Some(existing) => existing.initiative = Some(initiative),
        None => combatants.push(Combatant {
            actor_id: actor.id.clone(),
            initiative: Some(initiative),
        }),
    }
    ctx.host
        .update_entity(
            &combat.id,
            patch_at("system.combatants", serde_json::to_value(&combatants)?),
        )
        .await?;

    info!(actor_id = %actor.id, combat_id = %combat.id, initiative, "Initiative rolled");
    ok(json!({ "actorName": actor.name, "initiative": initiative }))
}

async fn turn_notification(ctx: ActionContext, _args: Vec<Value>) -> ActionResult {
    let Some(combat) = ctx.active_combat().await? else {
        return unavailable(NO_ACTIVE_COMBAT);
    };
    let Some(current) = combat.current_combatant() else {
        return unavailable("Active combat has no current combatant");
    };
    let Some(actor) = ctx.actor(&current.actor_id).await? else {
        return not_found("Actor", &current.actor_id);
    };

    ok(json!({ "combatantName": actor.name, "combatantId": actor.id }))
}

async fn combat_summary(ctx: ActionContext, _args: Vec<Value>) -> ActionResult {
    let Some(combat) = ctx.active_combat().await? else {
        return unavailable(NO_ACTIVE_COMBAT);
    };

    let mut combatants = Vec::new();
    for combatant in combat.combatants() {
        let name = ctx
            .actor(&combatant.actor_id)
            .await?
            .map(|actor| actor.name)
            .unwrap_or_else(|| "Unknown".to_string());
        combatants.push(json!({
            "name": name,
            "initiative": combatant.initiative,
            "id": combatant.actor_id,
        }));
    }

    ok(json!({ "combatName": combat.name, "combatants": combatants }))
}

async fn roll_attack(ctx: ActionContext, args: Vec<Value>) -> ActionResult {
    let params: AttackParams = payload(&args)?;
    let Some(actor) = ctx.actor(&params.actor_id).await? else {
        return not_found("Actor", &params.actor_id);
    };

    let attack = ctx.dice.roll(&params.attack_data.attack_formula)?;
    let damage = ctx.dice.roll(&params.attack_data.damage_formula)?;

    let speaker = Some(actor.name.as_str());
    ctx.host
        .create_chat_message(
            speaker,
            &format!("{} makes an attack! ({} = {})", actor.name, attack.formula, attack.total),
        )
        .await?;
    ctx.host
        .create_chat_message(
            speaker,
            &format!("{} deals damage! ({} = {})", actor.name, damage.formula, damage.total),
        )
        .await?;

    ok(json!({
        "actorName": actor.name,
        "attackTotal": attack.total,
        "damageTotal": damage.total,
    }))
}

async fn roll_saving_throw(ctx: ActionContext, args: Vec<Value>) -> ActionResult {
    let params: SaveParams = payload(&args)?;
    let save_type = params.save_type.to_ascii_lowercase();
    if !SAVE_TYPES.contains(&save_type.as_str()) {
        return Err(ActionError::InvalidParams(format!(
            "unknown save type: {}",
            params.save_type
        )));
    }
    let Some(actor) = ctx.actor(&params.actor_id).await? else {
        return not_found("Actor", &params.actor_id);
    };

    let bonus = actor
        .system_i64(&format!("abilities.{}.save", save_type))
        .unwrap_or_else(|| modifier(&actor, &save_type));
    let result = ctx.dice.roll("1d20")?.total.saturating_add(bonus);

    ok(json!({
        "actorName": actor.name,
        "saveType": save_type,
        "result": result,
    }))
}

async fn apply_damage_or_healing(ctx: ActionContext, args: Vec<Value>) -> ActionResult {
    let params: AmountParams = payload(&args)?;
    let Some(actor) = ctx.actor(&params.actor_id).await? else {
        return not_found("Actor", &params.actor_id);
    };

    let (hp, max) = hit_points(&actor);
    let new_hp = hp.saturating_add(params.amount).clamp(0, max.max(0));
    ctx.host
        .update_entity(&actor.id, patch_at("system.attributes.hp.value", json!(new_hp)))
        .await?;

    info!(actor_id = %actor.id, amount = params.amount, new_hp, "Damage or healing applied");
    ok(json!({ "actorName": actor.name, "newHP": new_hp }))
}
