// GET /history and DELETE /history handlers

use std::sync::Arc;
use tracing::info;
use warp::http::StatusCode;

use crate::conversation::SessionId;
use crate::error::{reject, ApiError};
use crate::models::HistoryResponse;
use crate::state::AppState;

pub async fn get_history_handler(
    session: SessionId,
    state: Arc<AppState>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let messages = state
        .store()
        .history(&session)
        .await
        .ok_or_else(|| reject(ApiError::not_found(format!("Unknown session '{}'", session))))?;

    Ok(warp::reply::json(&HistoryResponse {
        session_id: session,
        messages,
    }))
}

pub async fn reset_history_handler(
    session: SessionId,
    state: Arc<AppState>,
) -> Result<impl warp::Reply, warp::Rejection> {
    if !state.store().reset(&session).await {
        return Err(reject(ApiError::not_found(format!(
            "Unknown session '{}'",
            session
        ))));
    }

    info!(session = %session, "conversation reset");
    Ok(StatusCode::NO_CONTENT)
}
