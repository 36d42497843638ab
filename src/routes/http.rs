// GET handlers: version, api/stats

use axum::{extract::State, response::IntoResponse};

use super::AppState;
use crate::version::VERSION;

/// GET /version: the bare version string (from Cargo.toml at build time).
pub(super) async fn version_handler() -> &'static str {
    VERSION
}

/// GET /api/stats: process-wide analysis counters.
pub(super) async fn api_stats_handler(State(state): State<AppState>) -> impl IntoResponse {
    axum::Json(state.stats.snapshot())
}
