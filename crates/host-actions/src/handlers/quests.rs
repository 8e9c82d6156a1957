//! Quest log actions over journal entries flagged with `questLog`.

use super::{bind, not_found, ok, payload, ActionContext};
use crate::entity::patch_at;
use crate::{Entity, EntityKind};
use relay_router::{ActionRegistry, ActionResult};
use serde::Deserialize;
use serde_json::{json, Value};

pub async fn register(registry: &ActionRegistry, ctx: &ActionContext) {
    bind(registry, ctx, "viewQuestLog", view_quest_log).await;
    bind(registry, ctx, "addNote", add_note).await;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NoteParams {
    quest_id: String,
    note: String,
}

fn is_quest(entry: &Entity) -> bool {
    entry.kind == EntityKind::Journal && entry.flag("questLog").and_then(Value::as_bool) == Some(true)
}

fn content(entry: &Entity) -> &str {
    entry.system_str("content").unwrap_or_default()
}

async fn view_quest_log(ctx: ActionContext, _args: Vec<Value>) -> ActionResult {
    let quests: Vec<Value> = ctx
        .host
        .list_entities(EntityKind::Journal)
        .await?
        .iter()
        .filter(|entry| is_quest(entry))
        .map(|quest| {
            json!({
                "id": quest.id,
                "title": quest.name,
                "status": quest.flag("status").and_then(Value::as_str).unwrap_or("In Progress"),
                "content": content(quest),
            })
        })
        .collect();

    let summary = quests
        .iter()
        .map(|q| {
            format!(
                "**{}**\nStatus: {}\n{}\n",
                q["title"].as_str().unwrap_or_default(),
                q["status"].as_str().unwrap_or_default(),
                q["content"].as_str().unwrap_or_default()
            )
        })
        .collect::<Vec<_>>()
        .join("\n---\n");

    ok(json!({ "questLog": summary, "quests": quests }))
}

async fn add_note(ctx: ActionContext, args: Vec<Value>) -> ActionResult {
    let params: NoteParams = payload(&args)?;
    let Some(quest) = ctx
        .host
        .lookup_entity(&params.quest_id)
        .await?
        .filter(|e| e.kind == EntityKind::Journal)
    else {
        return not_found("Quest", &params.quest_id);
    };

    let updated = format!("{}\n\n**Note:** {}", content(&quest), params.note);
    ctx.host
        .update_entity(&quest.id, patch_at("system.content", json!(updated)))
        .await?;

    ok(json!({ "questTitle": quest.name, "note": params.note }))
}

#[cfg(test)]
mod tests {
    use super::super::testing::{context, host, invoke};
    use crate::HostStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_quest_log_lists_flagged_entries() {
        let host = host();
        let result = invoke(context(&host, 1), "viewQuestLog", json!({}))
            .await
            .unwrap();

        let quests = result["quests"].as_array().unwrap();
        assert_eq!(quests.len(), 2);
        assert_eq!(quests[0]["status"], "Active");
        assert_eq!(quests[1]["status"], "In Progress");
        assert_eq!(
            result["questLog"],
            "**Find the Lost Mine**\nStatus: Active\nTalk to Gundren.\n\n---\n\
             **Rescue Sildar**\nStatus: In Progress\nHe was taken by goblins.\n"
        );
    }

    #[tokio::test]
    async fn test_add_note_appends() {
        let host = host();
        let result = invoke(
            context(&host, 1),
            "addNote",
            json!({"questId": "j2", "note": "Seen near Cragmaw."}),
        )
        .await
        .unwrap();
        assert_eq!(result["questTitle"], "Rescue Sildar");

        let quest = host.lookup_entity("j2").await.unwrap().unwrap();
        assert_eq!(
            quest.system_str("content"),
            Some("He was taken by goblins.\n\n**Note:** Seen near Cragmaw.")
        );

        let result = invoke(
            context(&host, 1),
            "addNote",
            json!({"questId": "a1", "note": "x"}),
        )
        .await
        .unwrap();
        assert_eq!(result["error"], "not_found");
    }
}
