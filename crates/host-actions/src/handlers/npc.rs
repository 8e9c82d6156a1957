//! NPC lookup and random NPC generation.

use super::{bind, hit_points, not_found, ok, payload, ActionContext};
use crate::Entity;
use relay_router::{ActionRegistry, ActionResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const NPC_NAMES: [&str; 4] = ["Orc Warrior", "Goblin Shaman", "Bandit Leader", "Dire Wolf"];

pub async fn register(registry: &ActionRegistry, ctx: &ActionContext) {
    bind(registry, ctx, "queryNpcStats", query_npc_stats).await;
    bind(registry, ctx, "generateRandomNpc", generate_random_npc).await;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NpcParams {
    npc_id: String,
}

/// Stat block shared by looked-up and generated NPCs.
#[derive(Debug, Clone, PartialEq, Serialize)]
struct StatBlock {
    name: String,
    hp: i64,
    ac: i64,
    str: i64,
    dex: i64,
    con: i64,
    int: i64,
    wis: i64,
    cha: i64,
}

impl StatBlock {
    fn from_actor(actor: &Entity) -> Self {
        let ability = |key: &str| {
            actor
                .system_i64(&format!("abilities.{}.value", key))
                .unwrap_or(10)
        };
        Self {
            name: actor.name.clone(),
            hp: hit_points(actor).0,
            ac: actor.system_i64("attributes.ac.value").unwrap_or(10),
            str: ability("str"),
            dex: ability("dex"),
            con: ability("con"),
            int: ability("int"),
            wis: ability("wis"),
            cha: ability("cha"),
        }
    }

    fn summary(&self) -> String {
        format!(
            "**{}**\nHP: {}, AC: {}\nSTR: {}, DEX: {}, CON: {}\nINT: {}, WIS: {}, CHA: {}",
            self.name, self.hp, self.ac, self.str, self.dex, self.con, self.int, self.wis, self.cha
        )
    }
}

async fn query_npc_stats(ctx: ActionContext, args: Vec<Value>) -> ActionResult {
    let params: NpcParams = payload(&args)?;
    let Some(npc) = ctx.actor(&params.npc_id).await? else {
        return not_found("NPC", &params.npc_id);
    };

    let stats = StatBlock::from_actor(&npc);
    ok(json!({ "npcSummary": stats.summary(), "npcStats": stats }))
}

async fn generate_random_npc(ctx: ActionContext, _args: Vec<Value>) -> ActionResult {
    let dice = &ctx.dice;
    // roll_die is 1-based, offsets match the generator ranges
    let stat = |sides: u32, base: i64| i64::from(dice.roll_die(sides)).saturating_add(base);

    let npc = StatBlock {
        name: NPC_NAMES[dice.pick(NPC_NAMES.len())].to_string(),
        hp: stat(30, 19),
        ac: stat(6, 9),
        str: stat(8, 9),
        dex: stat(8, 9),
        con: stat(8, 9),
        int: stat(8, 7),
        wis: stat(8, 7),
        cha: stat(8, 7),
    };

    ok(json!({ "randomNpcSummary": npc.summary(), "npc": npc }))
}

#[cfg(test)]
mod tests {
    use super::super::testing::{context, host, invoke};
    use serde_json::json;

    #[tokio::test]
    async fn test_query_npc_stats() {
        let host = host();
        let result = invoke(context(&host, 1), "queryNpcStats", json!({"npcId": "a2"}))
            .await
            .unwrap();

        assert_eq!(result["npcStats"]["hp"], 7);
        assert_eq!(result["npcStats"]["dex"], 14);
        assert!(result["npcSummary"]
            .as_str()
            .unwrap()
            .starts_with("**Goblin**\nHP: 7, AC: 15"));
    }

    #[tokio::test]
    async fn test_random_npc_ranges() {
        let host = host();

        let low = invoke(context(&host, 1), "generateRandomNpc", json!({}))
            .await
            .unwrap();
        assert_eq!(low["npc"]["name"], "Orc Warrior");
        assert_eq!(low["npc"]["hp"], 20);
        assert_eq!(low["npc"]["ac"], 10);
        assert_eq!(low["npc"]["int"], 8);

        let high = invoke(context(&host, 99), "generateRandomNpc", json!({}))
            .await
            .unwrap();
        assert_eq!(high["npc"]["name"], "Dire Wolf");
        assert_eq!(high["npc"]["hp"], 49);
        assert_eq!(high["npc"]["ac"], 15);
        assert_eq!(high["npc"]["str"], 17);
        assert_eq!(high["npc"]["cha"], 15);
    }
}
