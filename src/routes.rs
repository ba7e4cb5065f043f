// Route definitions and handlers

use std::convert::Infallible;
use std::sync::Arc;
use warp::Filter;

use crate::conversation::SessionId;
use crate::error::{handle_rejection, reject, ApiError};
use crate::handlers;
use crate::state::AppState;

pub const SESSION_HEADER: &str = "x-session-id";

const MAX_BODY_BYTES: u64 = 64 * 1024;

/// All routes; every error, including 4xx/5xx JSON bodies, carries CORS headers
pub fn configure_routes(
    state: Arc<AppState>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    // GET /
    let status = warp::path::end()
        .and(warp::get())
        .and_then(handlers::status_handler);

    // POST /chat
    let chat = warp::path("chat")
        .and(warp::path::end())
        .and(warp::post())
        .and(with_session())
        .and(chat_body())
        .and(with_state(state.clone()))
        .and_then(handlers::chat_handler);

    // POST /chat-stream
    let chat_stream = warp::path("chat-stream")
        .and(warp::path::end())
        .and(warp::post())
        .and(with_session())
        .and(chat_body())
        .and(with_state(state.clone()))
        .and_then(handlers::chat_stream_handler);

    // GET /history
    let get_history = warp::path("history")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_session())
        .and(with_state(state.clone()))
        .and_then(handlers::get_history_handler);

    // DELETE /history
    let reset_history = warp::path("history")
        .and(warp::path::end())
        .and(warp::delete())
        .and(with_session())
        .and(with_state(state))
        .and_then(handlers::reset_history_handler);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
        .allow_headers(vec!["content-type", SESSION_HEADER]);

    status
        .or(chat)
        .or(chat_stream)
        .or(get_history)
        .or(reset_history)
        .recover(handle_rejection)
        .with(cors)
        .with(warp::trace::request())
}

fn with_state(
    state: Arc<AppState>,
) -> impl Filter<Extract = (Arc<AppState>,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

/// Session from the `x-session-id` header, `default` when absent
fn with_session() -> impl Filter<Extract = (SessionId,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>(SESSION_HEADER).and_then(|raw: Option<String>| async move {
        match raw {
            None => Ok(SessionId::default()),
            Some(raw) => SessionId::parse(raw.trim())
                .map_err(|e| reject(ApiError::bad_request(e.to_string()))),
        }
    })
}

fn chat_body() -> impl Filter<Extract = (crate::models::ChatRequest,), Error = warp::Rejection> + Clone
{
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}
