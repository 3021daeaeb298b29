//! Database context for managing the connection pool and repository access.

use diesel_async::SimpleAsyncConnection;

use super::document::DieselDocumentRepository;
use super::logs::DieselLogRepository;
use super::pool::{DbPool, DieselError};
use super::source::DieselSourceRepository;
use crate::with_conn;

/// Database context that owns the pool and hands out repositories.
///
/// # Example
/// ```ignore
/// let ctx = DbContext::from_url("sqlite:harvest.db");
/// ctx.init_schema().await?;
/// let sources = ctx.sources().get_all().await?;
/// ```
#[derive(Clone, Debug)]
pub struct DbContext {
    pool: DbPool,
}

impl DbContext {
    /// Create a new database context from a database URL or file path.
    pub fn from_url(database_url: &str) -> Self {
        Self {
            pool: DbPool::from_url(database_url),
        }
    }

    /// Get a source repository.
    pub fn sources(&self) -> DieselSourceRepository {
        DieselSourceRepository::new(self.pool.clone())
    }

    /// Get a document repository.
    pub fn documents(&self) -> DieselDocumentRepository {
        DieselDocumentRepository::new(self.pool.clone())
    }

    /// Get a run/log repository.
    pub fn logs(&self) -> DieselLogRepository {
        DieselLogRepository::new(self.pool.clone())
    }

    /// Initialize all database schemas.
    ///
    /// This creates the necessary tables if they don't exist.
    pub async fn init_schema(&self) -> Result<(), DieselError> {
        with_conn!(self.pool, conn, {
            conn.batch_execute(
                r#"
                PRAGMA journal_mode = WAL;

                CREATE TABLE IF NOT EXISTS sources (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    url_pattern TEXT NOT NULL,
                    source_type TEXT NOT NULL,
                    enabled INTEGER NOT NULL DEFAULT 1,
                    config TEXT NOT NULL DEFAULT '{}',
                    search_params TEXT NOT NULL DEFAULT '{}',
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS documents (
                    id TEXT PRIMARY KEY,
                    source_id TEXT NOT NULL,
                    url TEXT NOT NULL,
                    title TEXT NOT NULL,
                    content TEXT NOT NULL,
                    content_hash TEXT NOT NULL,
                    file_type TEXT NOT NULL DEFAULT 'collection',
                    video_url TEXT,
                    version INTEGER NOT NULL DEFAULT 1,
                    summary TEXT,
                    tags TEXT NOT NULL DEFAULT '[]',
                    file_path TEXT,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    UNIQUE(source_id, url)
                );

                CREATE TABLE IF NOT EXISTS document_versions (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    document_id TEXT NOT NULL REFERENCES documents(id),
                    version INTEGER NOT NULL,
                    title TEXT NOT NULL,
                    content TEXT NOT NULL,
                    content_hash TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    UNIQUE(document_id, version)
                );

                CREATE TABLE IF NOT EXISTS collection_runs (
                    id TEXT PRIMARY KEY,
                    source_id TEXT NOT NULL,
                    started_at TEXT NOT NULL,
                    finished_at TEXT NOT NULL,
                    outcome TEXT NOT NULL,
                    message TEXT NOT NULL,
                    url_count INTEGER NOT NULL,
                    success_count INTEGER NOT NULL,
                    failure_count INTEGER NOT NULL
                );

                CREATE TABLE IF NOT EXISTS collection_logs (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    run_id TEXT NOT NULL,
                    source_id TEXT NOT NULL,
                    url TEXT NOT NULL,
                    status TEXT NOT NULL,
                    error_message TEXT,
                    document_id TEXT,
                    executed_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_documents_source ON documents(source_id);
                CREATE INDEX IF NOT EXISTS idx_logs_source ON collection_logs(source_id, executed_at);
                CREATE INDEX IF NOT EXISTS idx_runs_source ON collection_runs(source_id, started_at);
                "#,
            )
            .await
        })
    }
}
