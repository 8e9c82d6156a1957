//! Spell casting and ability use.
//!
//! Both actions post a chat message on behalf of the caster and report the
//! use to the host. Spells with a healing damage part also heal the target,
//! capped at its maximum hit points.

use super::{bind, description, hit_points, not_found, ok, payload, ActionContext};
use crate::entity::patch_at;
use crate::Entity;
use relay_router::{ActionRegistry, ActionResult};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

const UNKNOWN_TARGET: &str = "Unknown Target";

pub async fn register(registry: &ActionRegistry, ctx: &ActionContext) {
    bind(registry, ctx, "castSpell", cast_spell).await;
    bind(registry, ctx, "useAbility", use_ability).await;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CastParams {
    caster_id: String,
    spell_id: String,
    #[serde(default)]
    target_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AbilityParams {
    caster_id: String,
    ability_id: String,
    #[serde(default)]
    target_id: Option<String>,
}

/// Caster, item and optional target resolved for a use.
struct Usage {
    caster: Entity,
    item: Entity,
    target: Option<Entity>,
}

impl Usage {
    fn target_name(&self) -> &str {
        self.target
            .as_ref()
            .map(|t| t.name.as_str())
            .unwrap_or(UNKNOWN_TARGET)
    }
}

/// Resolve caster and item of the given type, or the not-found result.
async fn resolve(
    ctx: &ActionContext,
    caster_id: &str,
    item_id: &str,
    item_type: &str,
    target_id: Option<&str>,
) -> Result<Usage, ActionResult> {
    let caster = match ctx.actor(caster_id).await {
        Ok(Some(caster)) => caster,
        Ok(None) => return Err(not_found("Caster", caster_id)),
        Err(e) => return Err(Err(e.into())),
    };
    let item = match ctx.owned_item(caster_id, item_id).await {
        Ok(Some(item)) if item.is_subtype(item_type) => item,
        Ok(_) => {
            let what = if item_type == "spell" { "Spell" } else { "Ability" };
            return Err(not_found(what, item_id));
        }
        Err(e) => return Err(Err(e.into())),
    };
    let target = match target_id {
        Some(id) => match ctx.actor(id).await {
            Ok(target) => target,
            Err(e) => return Err(Err(e.into())),
        },
        None => None,
    };

    Ok(Usage {
        caster,
        item,
        target,
    })
}

/// Healing formula of a spell: the first `[formula, "healing"]` damage part.
fn healing_formula(spell: &Entity) -> Option<&str> {
    spell
        .system_at("damage.parts")?
        .as_array()?
        .iter()
        .filter_map(Value::as_array)
        .find(|part| part.get(1).and_then(Value::as_str) == Some("healing"))
        .and_then(|part| part.first())
        .and_then(Value::as_str)
}

async fn announce(ctx: &ActionContext, usage: &Usage, verb: &str, description: &str) -> ActionResult {
    let content = format!(
        "<strong>{}</strong> {} <strong>{}</strong> on <strong>{}</strong><br>{}",
        usage.caster.name,
        verb,
        usage.item.name,
        usage.target_name(),
        description
    );
    ctx.host
        .create_chat_message(Some(&usage.caster.name), &content)
        .await?;
    ctx.host.use_item(&usage.caster.id, &usage.item.id).await?;
    Ok(Value::Null)
}

async fn cast_spell(ctx: ActionContext, args: Vec<Value>) -> ActionResult {
    let params: CastParams = payload(&args)?;
    let usage = match resolve(
        &ctx,
        &params.caster_id,
        &params.spell_id,
        "spell",
        params.target_id.as_deref(),
    )
    .await
    {
        Ok(usage) => usage,
        Err(result) => return result,
    };

    let description = description(&usage.item);
    announce(&ctx, &usage, "casts", &description).await?;

    let mut result = json!({
        "casterName": usage.caster.name,
        "spellName": usage.item.name,
        "targetName": usage.target_name(),
        "description": description,
    });

    if let (Some(target), Some(formula)) = (&usage.target, healing_formula(&usage.item)) {
        let healing = ctx.dice.roll(formula)?.total.max(0);
        let (hp, max) = hit_points(target);
        let new_hp = hp.saturating_add(healing).min(max);
        ctx.host
            .update_entity(&target.id, patch_at("system.attributes.hp.value", json!(new_hp)))
            .await?;

        info!(target_id = %target.id, healing, new_hp, "Spell healed target");
        result["effect"] = json!(format!("heals {} for {} HP", target.name, healing));
    }

    info!(
        caster_id = %usage.caster.id,
        spell = %usage.item.name,
        target = %usage.target_name(),
        "Spell cast"
    );
    ok(result)
}

async fn use_ability(ctx: ActionContext, args: Vec<Value>) -> ActionResult {
    let params: AbilityParams = payload(&args)?;
    let usage = match resolve(
        &ctx,
        &params.caster_id,
        &params.ability_id,
        "feat",
        params.target_id.as_deref(),
    )
    .await
    {
        Ok(usage) => usage,
        Err(result) => return result,
    };

    let description = description(&usage.item);
    announce(&ctx, &usage, "uses", &description).await?;

    info!(caster_id = %usage.caster.id, ability = %usage.item.name, "Ability used");
    ok(json!({
        "casterName": usage.caster.name,
        "abilityName": usage.item.name,
        "targetName": usage.target_name(),
        "description": description,
    }))
}
