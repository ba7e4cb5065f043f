// POST /chat-stream handler

use std::sync::Arc;
use tracing::info;
use warp::http::header::{HeaderValue, CACHE_CONTROL, CONTENT_TYPE};
use warp::hyper::Body;
use warp::reply::Response;

use crate::conversation::SessionId;
use crate::error::reject;
use crate::models::ChatRequest;
use crate::state::AppState;

/// Reply as a chunked `text/plain` body, one chunk per fragment
pub async fn chat_stream_handler(
    session: SessionId,
    request: ChatRequest,
    state: Arc<AppState>,
) -> Result<impl warp::Reply, warp::Rejection> {
    info!(session = %session, chars = request.message.len(), "POST /chat-stream");

    let fragments = state
        .relay
        .stream(&session, request.message)
        .await
        .map_err(reject)?;

    let mut response = Response::new(Body::wrap_stream(fragments));
    let headers = response.headers_mut();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

    Ok(response)
}
