// HTTP routes

mod analyse;
mod http;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::orchestrator::BatchOrchestrator;
use crate::stats::AnalysisStats;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) orchestrator: Arc<BatchOrchestrator>,
    pub(crate) stats: Arc<AnalysisStats>,
}

pub fn app(orchestrator: Arc<BatchOrchestrator>, stats: Arc<AnalysisStats>) -> Router {
    let state = AppState {
        orchestrator,
        stats,
    };
    Router::new()
        // POST /analyse; batches have no size cap
        .route(
            "/analyse",
            post(analyse::analyse_handler).layer(DefaultBodyLimit::disable()),
        )
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/stats", get(http::api_stats_handler)) // GET /api/stats
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
