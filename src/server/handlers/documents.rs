//! Collected document and version history endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use serde::Deserialize;

use super::super::AppState;
use super::error_response;

/// Query params for document listings.
#[derive(Debug, Deserialize)]
pub struct DocumentListParams {
    pub limit: Option<i64>,
}

/// Current documents collected from a source, most recently updated first.
pub async fn source_documents(
    State(state): State<AppState>,
    Path(source_id): Path<String>,
    Query(params): Query<DocumentListParams>,
) -> impl IntoResponse {
    let limit = params.limit.unwrap_or(50).clamp(1, 500);
    match state.db().documents().get_by_source(&source_id, limit).await {
        Ok(docs) => {
            let items: Vec<_> = docs
                .iter()
                .map(|d| {
                    serde_json::json!({
                        "id": d.id,
                        "url": d.url,
                        "title": d.title,
                        "version": d.version,
                        "summary": d.summary,
                        "tags": d.tags,
                        "file_path": d.file_path,
                        "updated_at": d.updated_at.to_rfc3339(),
                    })
                })
                .collect();
            Json(items).into_response()
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

/// Current version of a document.
pub async fn get_document(
    State(state): State<AppState>,
    Path(doc_id): Path<String>,
) -> impl IntoResponse {
    match state.store().get(&doc_id).await {
        Ok(Some(doc)) => Json(doc).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Document not found"),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

/// Version history of a document, oldest first, without bodies.
pub async fn document_versions(
    State(state): State<AppState>,
    Path(doc_id): Path<String>,
) -> impl IntoResponse {
    let doc = match state.store().get(&doc_id).await {
        Ok(Some(doc)) => doc,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "Document not found"),
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    };

    let versions = match state.store().versions(&doc_id).await {
        Ok(versions) => versions,
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    };

    let entries: Vec<_> = versions
        .iter()
        .map(|v| {
            serde_json::json!({
                "version": v.version,
                "title": v.title,
                "content_hash": v.content_hash,
                "created_at": v.created_at.to_rfc3339(),
            })
        })
        .collect();

    Json(serde_json::json!({
        "document_id": doc.id,
        "url": doc.url,
        "current_version": doc.version,
        "version_count": entries.len(),
        "versions": entries,
    }))
    .into_response()
}

/// One historical version, including its body.
pub async fn document_version(
    State(state): State<AppState>,
    Path((doc_id, version)): Path<(String, i32)>,
) -> impl IntoResponse {
    match state.store().get_version(&doc_id, version).await {
        Ok(Some(v)) => Json(v).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Version not found"),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}
