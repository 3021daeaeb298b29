//! Trigger, progress and log endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use super::super::AppState;
use super::error_response;
use crate::collector::TriggerError;
use crate::models::LogStatus;
use crate::repository::{LogQuery, DEFAULT_LOG_LIMIT};

/// Query params for the log listing.
#[derive(Debug, Deserialize)]
pub struct LogParams {
    pub source_id: Option<String>,
    pub status: Option<String>,
    pub limit: Option<i64>,
}

/// Query params for the run listing.
#[derive(Debug, Deserialize)]
pub struct RunParams {
    pub source_id: Option<String>,
    pub limit: Option<i64>,
}

fn trigger_status(e: &TriggerError) -> StatusCode {
    match e {
        TriggerError::NotFound(_) => StatusCode::NOT_FOUND,
        TriggerError::Disabled(_) | TriggerError::InvalidConfig { .. } => StatusCode::BAD_REQUEST,
        TriggerError::AlreadyRunning(_) => StatusCode::CONFLICT,
        TriggerError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Start a run for one source. Returns once the run is pending.
pub async fn trigger_source(
    State(state): State<AppState>,
    Path(source_id): Path<String>,
) -> impl IntoResponse {
    match state.collector.trigger(&source_id).await {
        Ok(_handle) => (
            StatusCode::ACCEPTED,
            Json(serde_json::json!({
                "source_id": source_id,
                "status": "pending",
                "message": "Collection started",
            })),
        )
            .into_response(),
        Err(e) => error_response(trigger_status(&e), e),
    }
}

/// Start runs for every enabled source.
pub async fn trigger_all(State(state): State<AppState>) -> impl IntoResponse {
    let reports = match state.collector.trigger_all().await {
        Ok(reports) => reports,
        Err(e) => return error_response(trigger_status(&e), e),
    };

    let results: Vec<_> = reports
        .iter()
        .map(|report| {
            let (status, error) = match &report.result {
                Ok(()) => ("started", None),
                Err(TriggerError::AlreadyRunning(_)) => ("skipped", None),
                Err(e) => ("rejected", Some(e.to_string())),
            };
            serde_json::json!({
                "source_id": report.source_id,
                "status": status,
                "error": error,
            })
        })
        .collect();
    let started = reports.iter().filter(|r| r.result.is_ok()).count();

    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({
            "started": started,
            "results": results,
        })),
    )
        .into_response()
}

/// Live progress for a source. Unknown sources report idle.
pub async fn source_progress(
    State(state): State<AppState>,
    Path(source_id): Path<String>,
) -> impl IntoResponse {
    Json(state.collector.progress(&source_id))
}

/// Per-URL log entries, newest first.
pub async fn list_logs(
    State(state): State<AppState>,
    Query(params): Query<LogParams>,
) -> impl IntoResponse {
    let status = match params.status.as_deref() {
        None | Some("") => None,
        Some(raw) => match LogStatus::from_str(raw) {
            Some(status) => Some(status),
            None => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Unknown log status: {}", raw),
                )
            }
        },
    };

    let query = LogQuery {
        source_id: params.source_id,
        status,
        limit: Some(params.limit.unwrap_or(DEFAULT_LOG_LIMIT)),
    };
    match state.db().logs().list_logs(&query).await {
        Ok(logs) => Json(logs).into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

/// Finished runs, newest first.
pub async fn list_runs(
    State(state): State<AppState>,
    Query(params): Query<RunParams>,
) -> impl IntoResponse {
    let limit = params.limit.unwrap_or(DEFAULT_LOG_LIMIT);
    match state
        .db()
        .logs()
        .list_runs(params.source_id.as_deref(), limit)
        .await
    {
        Ok(runs) => Json(runs).into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}
