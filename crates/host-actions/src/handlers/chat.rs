//! Chat relay actions.

use super::{bind, not_found, ok, payload, ActionContext};
use relay_router::{ActionRegistry, ActionResult};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

pub async fn register(registry: &ActionRegistry, ctx: &ActionContext) {
    bind(registry, ctx, "relayChatToDiscord", relay_chat).await;
    bind(registry, ctx, "relayRPCommand", relay_rp_command).await;
}

#[derive(Debug, Deserialize)]
struct MessageParams {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpParams {
    character_id: String,
    message: String,
}

async fn relay_chat(_ctx: ActionContext, args: Vec<Value>) -> ActionResult {
    let params: MessageParams = payload(&args)?;
    debug!(message = %params.message, "Relaying chat message");
    ok(json!({ "message": params.message }))
}

async fn relay_rp_command(ctx: ActionContext, args: Vec<Value>) -> ActionResult {
    let params: RpParams = payload(&args)?;
    let Some(character) = ctx.actor(&params.character_id).await? else {
        return not_found("Character", &params.character_id);
    };

    let content = format!("<strong>{}</strong>: {}", character.name, params.message);
    ctx.host
        .create_chat_message(Some(&character.name), &content)
        .await?;

    ok(json!({
        "characterName": character.name,
        "message": params.message,
    }))
}
