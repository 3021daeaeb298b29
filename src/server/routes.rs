//! Router configuration for the web server.

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
        // Sources
        .route(
            "/api/collection/sources",
            get(handlers::list_sources).post(handlers::create_source),
        )
        .route(
            "/api/collection/sources/:source_id",
            get(handlers::get_source)
                .put(handlers::update_source)
                .delete(handlers::delete_source),
        )
        // Runs and progress
        .route(
            "/api/collection/sources/:source_id/trigger",
            post(handlers::trigger_source),
        )
        .route(
            "/api/collection/sources/:source_id/progress",
            get(handlers::source_progress),
        )
        .route(
            "/api/collection/sources/:source_id/documents",
            get(handlers::source_documents),
        )
        .route("/api/collection/trigger", post(handlers::trigger_all))
        .route("/api/collection/logs", get(handlers::list_logs))
        .route("/api/collection/runs", get(handlers::list_runs))
        // Documents and history
        .route("/api/documents/:doc_id", get(handlers::get_document))
        .route(
            "/api/documents/:doc_id/versions",
            get(handlers::document_versions),
        )
        .route(
            "/api/documents/:doc_id/versions/:version",
            get(handlers::document_version),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
