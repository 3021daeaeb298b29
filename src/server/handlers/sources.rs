//! Source management endpoints.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use super::super::AppState;
use super::error_response;
use crate::config::SourceConfig;
use crate::models::{CollectionSource, SourceType};

/// Body for creating a source.
#[derive(Debug, Deserialize)]
pub struct NewSource {
    pub id: String,
    pub name: String,
    pub url_pattern: String,
    #[serde(default)]
    pub source_type: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub config: serde_json::Value,
    #[serde(default)]
    pub search_params: BTreeMap<String, String>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Deserialize)]
pub struct SourceUpdate {
    pub name: Option<String>,
    pub url_pattern: Option<String>,
    pub source_type: Option<String>,
    pub enabled: Option<bool>,
    pub config: Option<serde_json::Value>,
    pub search_params: Option<BTreeMap<String, String>>,
}

fn default_enabled() -> bool {
    true
}

fn parse_source_type(raw: Option<&str>) -> Result<Option<SourceType>, String> {
    match raw {
        None => Ok(None),
        Some(s) => SourceType::from_str(s)
            .map(Some)
            .ok_or_else(|| format!("unknown source_type: {}", s)),
    }
}

/// List all sources.
pub async fn list_sources(State(state): State<AppState>) -> impl IntoResponse {
    match state.db().sources().get_all().await {
        Ok(sources) => Json(sources).into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

/// Get one source.
pub async fn get_source(
    State(state): State<AppState>,
    Path(source_id): Path<String>,
) -> impl IntoResponse {
    match state.db().sources().get(&source_id).await {
        Ok(Some(source)) => Json(source).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Source not found"),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

/// Register a new source. The configuration is validated up front.
pub async fn create_source(
    State(state): State<AppState>,
    Json(body): Json<NewSource>,
) -> impl IntoResponse {
    if body.id.trim().is_empty() || body.url_pattern.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "id and url_pattern are required");
    }
    let source_type = match parse_source_type(body.source_type.as_deref()) {
        Ok(t) => t.unwrap_or(SourceType::Webpage),
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e),
    };
    if let Err(e) = SourceConfig::from_value(&body.config) {
        return error_response(StatusCode::BAD_REQUEST, e);
    }

    let repo = state.db().sources();
    match repo.get(&body.id).await {
        Ok(Some(_)) => {
            return error_response(
                StatusCode::CONFLICT,
                format!("Source already exists: {}", body.id),
            )
        }
        Ok(None) => {}
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    }

    let mut source = CollectionSource::new(body.id, body.name, body.url_pattern, source_type);
    source.enabled = body.enabled;
    source.config = body.config;
    source.search_params = body.search_params;

    match repo.save(&source).await {
        Ok(()) => (StatusCode::CREATED, Json(source)).into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

/// Update an existing source.
pub async fn update_source(
    State(state): State<AppState>,
    Path(source_id): Path<String>,
    Json(body): Json<SourceUpdate>,
) -> impl IntoResponse {
    let repo = state.db().sources();
    let mut source = match repo.get(&source_id).await {
        Ok(Some(source)) => source,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "Source not found"),
        Err(e) => return error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    };

    match parse_source_type(body.source_type.as_deref()) {
        Ok(Some(t)) => source.source_type = t,
        Ok(None) => {}
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e),
    }
    if let Some(config) = body.config {
        if let Err(e) = SourceConfig::from_value(&config) {
            return error_response(StatusCode::BAD_REQUEST, e);
        }
        source.config = config;
    }
    if let Some(name) = body.name {
        source.name = name;
    }
    if let Some(url_pattern) = body.url_pattern {
        source.url_pattern = url_pattern;
    }
    if let Some(enabled) = body.enabled {
        source.enabled = enabled;
    }
    if let Some(params) = body.search_params {
        source.search_params = params;
    }
    source.updated_at = Utc::now();

    match repo.save(&source).await {
        Ok(()) => Json(source).into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

/// Remove a source. Refused while a run is in flight.
pub async fn delete_source(
    State(state): State<AppState>,
    Path(source_id): Path<String>,
) -> impl IntoResponse {
    if state.collector.tracker().is_active(&source_id) {
        return error_response(
            StatusCode::CONFLICT,
            format!("A collection is running for {}", source_id),
        );
    }
    match state.db().sources().delete(&source_id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => error_response(StatusCode::NOT_FOUND, "Source not found"),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}
