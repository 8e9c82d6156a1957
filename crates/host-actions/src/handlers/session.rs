//! Session announcements.

use super::{bind, ok, payload, ActionContext};
use chrono::Utc;
use relay_router::{ActionRegistry, ActionResult};
use serde::Deserialize;
use serde_json::{json, Value};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

pub async fn register(registry: &ActionRegistry, ctx: &ActionContext) {
    bind(registry, ctx, "startSession", start_session).await;
    bind(registry, ctx, "endSession", end_session).await;
    bind(registry, ctx, "logSessionNotes", log_session_notes).await;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionData {
    session_title: String,
    #[serde(default)]
    participants: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionParams {
    session_data: SessionData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogData {
    session_title: String,
    notes: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogParams {
    log_data: LogData,
}

fn notification(message: String, kind: &str) -> ActionResult {
    ok(json!({ "message": message, "type": kind }))
}

async fn start_session(_ctx: ActionContext, args: Vec<Value>) -> ActionResult {
    let params: SessionParams = payload(&args)?;
    let session = params.session_data;
    notification(
        format!(
            "**Session Started: {}**\nStart Time: {}\nParticipants: {}\nGood luck and enjoy the adventure!",
            session.session_title,
            Utc::now().format(TIME_FORMAT),
            session.participants.join(", ")
        ),
        "startSession",
    )
}

async fn end_session(_ctx: ActionContext, args: Vec<Value>) -> ActionResult {
    let params: SessionParams = payload(&args)?;
    notification(
        format!(
            "**Session Ended: {}**\nEnd Time: {}\nThank you for playing. See you next time!",
            params.session_data.session_title,
            Utc::now().format(TIME_FORMAT)
        ),
        "endSession",
    )
}

async fn log_session_notes(_ctx: ActionContext, args: Vec<Value>) -> ActionResult {
    let params: LogParams = payload(&args)?;
    notification(
        format!(
            "**Session Notes for {}:**\n{}",
            params.log_data.session_title, params.log_data.notes
        ),
        "sessionLog",
    )
}
