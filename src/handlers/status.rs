// GET / handler

use crate::models::StatusResponse;

pub async fn status_handler() -> Result<impl warp::Reply, warp::Rejection> {
    Ok(warp::reply::json(&StatusResponse::running()))
}
