//! Router configuration for the API server.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/upload", post(handlers::upload_document))
        .route("/api/analyze", post(handlers::analyze_text))
        .route("/api/jobs/:job_id", get(handlers::get_job))
        .route("/api/metrics", get(handlers::metrics_stats))
        .route("/api/cache/sweep", post(handlers::sweep_cache))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
