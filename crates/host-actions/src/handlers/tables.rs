//! Roll tables and random encounters.

use super::{bind, not_found, ok, payload, ActionContext};
use crate::{Entity, EntityKind};
use relay_router::{ActionRegistry, ActionResult};
use serde::Deserialize;
use serde_json::{json, Value};

pub async fn register(registry: &ActionRegistry, ctx: &ActionContext) {
    bind(registry, ctx, "rollOnTable", roll_on_table).await;
    bind(registry, ctx, "generateEncounter", generate_encounter).await;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableParams {
    table_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EncounterParams {
    #[serde(default)]
    encounter_type: String,
}

/// One row of a roll table, matching rolls in `range` (inclusive).
#[derive(Debug, Deserialize)]
struct TableRow {
    range: (i64, i64),
    text: String,
}

fn encounters(encounter_type: &str) -> &'static [&'static str] {
    match encounter_type {
        "forest" => &["Wolf", "Goblin Scout", "Bandit"],
        "dungeon" => &["Skeleton", "Zombie", "Giant Spider"],
        "town" => &["Thief", "Guard Patrol", "Pickpocket"],
        _ => &[],
    }
}

fn rows(table: &Entity) -> Vec<TableRow> {
    table
        .system_at("results")
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .filter_map(|row| serde_json::from_value(row.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

async fn roll_on_table(ctx: ActionContext, args: Vec<Value>) -> ActionResult {
    let params: TableParams = payload(&args)?;
    let Some(table) = ctx
        .host
        .lookup_entity(&params.table_id)
        .await?
        .filter(|e| e.kind == EntityKind::Table)
    else {
        return not_found("Table", &params.table_id);
    };

    let rows = rows(&table);
    let formula = table
        .system_str("formula")
        .map(String::from)
        .unwrap_or_else(|| format!("1d{}", rows.len().max(1)));
    let roll = ctx.dice.roll(&formula)?;

    let drawn: Vec<&str> = rows
        .iter()
        .filter(|row| (row.range.0..=row.range.1).contains(&roll.total))
        .map(|row| row.text.as_str())
        .collect();
    let result = if drawn.is_empty() {
        "No result".to_string()
    } else {
        drawn.join(", ")
    };

    ok(json!({
        "tableName": table.name,
        "roll": roll.total,
        "result": result,
    }))
}

async fn generate_encounter(ctx: ActionContext, args: Vec<Value>) -> ActionResult {
    let params: EncounterParams = payload(&args)?;
    let options = encounters(&params.encounter_type);
    let encounter = if options.is_empty() {
        "Nothing found"
    } else {
        options[ctx.dice.pick(options.len())]
    };

    ok(json!({
        "encounterType": params.encounter_type,
        "encounter": encounter,
    }))
}
