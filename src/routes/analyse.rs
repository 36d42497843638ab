// POST /analyse: validate the whole batch, then stream results as a JSON array

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use super::AppState;
use crate::models::{RawPost, validate_batch};

fn bad_request(message: String) -> Response {
    tracing::info!(error = %message, "rejected analyse request");
    (
        StatusCode::BAD_REQUEST,
        axum::Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}

/// The batch is decoded and checked up front: once the first chunk is flushed a
/// bad post can no longer be reported with a status code.
pub(super) async fn analyse_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let posts: Vec<RawPost> = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => return bad_request(format!("invalid post batch: {}", e)),
    };
    if let Err(e) = validate_batch(&posts) {
        return bad_request(e.to_string());
    }

    let stream = state.orchestrator.clone().spawn_stream(posts);
    (
        [(header::CONTENT_TYPE, "application/json")],
        Body::from_stream(stream),
    )
        .into_response()
}
