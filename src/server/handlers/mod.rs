//! HTTP request handlers for the web server.

mod collection;
mod documents;
mod sources;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

pub use collection::{list_logs, list_runs, source_progress, trigger_all, trigger_source};
pub use documents::{document_version, document_versions, get_document, source_documents};
pub use sources::{create_source, delete_source, get_source, list_sources, update_source};

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    StatusCode::OK
}

/// JSON error body with the given status.
pub(super) fn error_response(status: StatusCode, message: impl std::fmt::Display) -> Response {
    (
        status,
        Json(serde_json::json!({ "error": message.to_string() })),
    )
        .into_response()
}
