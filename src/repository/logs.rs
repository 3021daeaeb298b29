//! Collection run and per-URL log repository.

use diesel::prelude::*;
use diesel::sqlite::Sqlite;
use diesel_async::{AsyncConnection, RunQueryDsl};

use super::models::{CollectionLogRecord, CollectionRunRecord, NewCollectionLog, NewCollectionRun};
use super::parse_datetime;
use super::pool::{DbPool, DieselError};
use crate::models::{CollectionLog, CollectionRun, LogStatus, RunOutcome};
use crate::schema::{collection_logs, collection_runs};
use crate::with_conn;

/// Summary row of a finished run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RunSummary {
    pub id: String,
    pub source_id: String,
    pub started_at: String,
    pub finished_at: String,
    pub outcome: RunOutcome,
    pub message: String,
    pub url_count: i32,
    pub success_count: i32,
    pub failure_count: i32,
}

impl From<CollectionRunRecord> for RunSummary {
    fn from(record: CollectionRunRecord) -> Self {
        Self {
            outcome: RunOutcome::from_str(&record.outcome).unwrap_or(RunOutcome::Failed),
            id: record.id,
            source_id: record.source_id,
            started_at: record.started_at,
            finished_at: record.finished_at,
            message: record.message,
            url_count: record.url_count,
            success_count: record.success_count,
            failure_count: record.failure_count,
        }
    }
}

impl From<CollectionLogRecord> for CollectionLog {
    fn from(record: CollectionLogRecord) -> Self {
        Self {
            id: record.id,
            run_id: record.run_id,
            source_id: record.source_id,
            url: record.url,
            status: LogStatus::from_str(&record.status).unwrap_or(LogStatus::Failed),
            error_message: record.error_message,
            document_id: record.document_id,
            executed_at: parse_datetime(&record.executed_at),
        }
    }
}

/// Filters for log queries.
#[derive(Debug, Clone, Default)]
pub struct LogQuery {
    pub source_id: Option<String>,
    pub status: Option<LogStatus>,
    pub limit: Option<i64>,
}

/// Default number of log entries returned.
pub const DEFAULT_LOG_LIMIT: i64 = 100;

/// Diesel-based repository for run records and per-URL logs.
#[derive(Clone)]
pub struct DieselLogRepository {
    pool: DbPool,
}

impl DieselLogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Persist a finished run and one log entry per URL.
    pub async fn record_run(&self, run: &CollectionRun) -> Result<(), DieselError> {
        let started_at = run.started_at.to_rfc3339();
        let finished_at = run.finished_at.to_rfc3339();

        with_conn!(self.pool, conn, {
            conn.transaction(|conn| {
                Box::pin(async move {
                    diesel::insert_into(collection_runs::table)
                        .values(NewCollectionRun {
                            id: &run.id,
                            source_id: &run.source_id,
                            started_at: &started_at,
                            finished_at: &finished_at,
                            outcome: run.outcome.as_str(),
                            message: &run.message,
                            url_count: run.urls.len() as i32,
                            success_count: run.succeeded() as i32,
                            failure_count: run.failed() as i32,
                        })
                        .execute(conn)
                        .await?;

                    for entry in &run.urls {
                        diesel::insert_into(collection_logs::table)
                            .values(NewCollectionLog {
                                run_id: &run.id,
                                source_id: &run.source_id,
                                url: &entry.url,
                                status: LogStatus::from(entry.kind).as_str(),
                                error_message: entry.error.as_deref(),
                                document_id: entry.document_id.as_deref(),
                                executed_at: &finished_at,
                            })
                            .execute(conn)
                            .await?;
                    }
                    Ok(())
                })
            })
            .await
        })
    }

    /// Query log entries, newest first.
    pub async fn list_logs(&self, query: &LogQuery) -> Result<Vec<CollectionLog>, DieselError> {
        let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT).clamp(1, 1000);
        with_conn!(self.pool, conn, {
            let mut q = collection_logs::table.into_boxed::<Sqlite>();
            if let Some(ref source_id) = query.source_id {
                q = q.filter(collection_logs::source_id.eq(source_id.clone()));
            }
            if let Some(status) = query.status {
                q = q.filter(collection_logs::status.eq(status.as_str()));
            }
            let records: Vec<CollectionLogRecord> = q
                .order((collection_logs::executed_at.desc(), collection_logs::id.desc()))
                .limit(limit)
                .load(&mut conn)
                .await?;
            Ok(records.into_iter().map(CollectionLog::from).collect())
        })
    }

    /// List run summaries, newest first.
    pub async fn list_runs(
        &self,
        source_id: Option<&str>,
        limit: i64,
    ) -> Result<Vec<RunSummary>, DieselError> {
        with_conn!(self.pool, conn, {
            let mut q = collection_runs::table.into_boxed::<Sqlite>();
            if let Some(source_id) = source_id {
                q = q.filter(collection_runs::source_id.eq(source_id.to_string()));
            }
            let records: Vec<CollectionRunRecord> = q
                .order(collection_runs::started_at.desc())
                .limit(limit.clamp(1, 1000))
                .load(&mut conn)
                .await?;
            Ok(records.into_iter().map(RunSummary::from).collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UrlOutcome;
    use crate::repository::DbContext;
    use chrono::Utc;
    use tempfile::tempdir;

    fn run(source_id: &str) -> CollectionRun {
        CollectionRun {
            id: uuid::Uuid::new_v4().to_string(),
            source_id: source_id.to_string(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            outcome: RunOutcome::Partial,
            message: "2 of 3 URLs collected".to_string(),
            urls: vec![
                UrlOutcome::success("https://example.com/a", "doc-a".to_string()),
                UrlOutcome::unchanged("https://example.com/b", "doc-b".to_string()),
                UrlOutcome::failed("https://example.com/c", "timed out"),
            ],
        }
    }

    #[tokio::test]
    async fn test_record_and_query_logs() {
        let dir = tempdir().unwrap();
        let ctx = DbContext::from_url(&dir.path().join("test.db").display().to_string());
        ctx.init_schema().await.unwrap();
        let repo = ctx.logs();

        repo.record_run(&run("news")).await.unwrap();
        repo.record_run(&run("blog")).await.unwrap();

        let all = repo.list_logs(&LogQuery::default()).await.unwrap();
        assert_eq!(all.len(), 6);

        let failed = repo
            .list_logs(&LogQuery {
                source_id: Some("news".to_string()),
                status: Some(LogStatus::Failed),
                limit: None,
            })
            .await
            .unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].url, "https://example.com/c");
        assert_eq!(failed[0].error_message.as_deref(), Some("timed out"));

        let skipped = repo
            .list_logs(&LogQuery {
                status: Some(LogStatus::Skipped),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(skipped.len(), 2);

        let limited = repo
            .list_logs(&LogQuery {
                limit: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(limited.len(), 2);

        let runs = repo.list_runs(Some("news"), 10).await.unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].outcome, RunOutcome::Partial);
        assert_eq!(runs[0].failure_count, 1);
        assert_eq!(runs[0].success_count, 2);
    }
}
