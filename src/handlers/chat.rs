// POST /chat handler

use std::sync::Arc;
use tracing::info;

use crate::conversation::SessionId;
use crate::error::reject;
use crate::models::{ChatReply, ChatRequest};
use crate::state::AppState;

pub async fn chat_handler(
    session: SessionId,
    request: ChatRequest,
    state: Arc<AppState>,
) -> Result<impl warp::Reply, warp::Rejection> {
    info!(session = %session, chars = request.message.len(), "POST /chat");

    let reply = state
        .relay
        .complete(&session, request.message)
        .await
        .map_err(reject)?;

    Ok(warp::reply::json(&ChatReply { reply }))
}
