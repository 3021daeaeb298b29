//! SQLite connection pool.
//!
//! Connections are cheap to open for SQLite, so the pool simply establishes
//! one per operation and wraps it for use with diesel-async.

use diesel::sqlite::SqliteConnection;
use diesel_async::sync_connection_wrapper::SyncConnectionWrapper;
use diesel_async::{AsyncConnection, SimpleAsyncConnection};

use super::util::to_diesel_error;

/// Diesel error type alias.
pub type DieselError = diesel::result::Error;

/// Async SQLite connection type.
pub type SqliteConn = SyncConnectionWrapper<SqliteConnection>;

/// SQLite connection pool (lightweight - creates connections on demand).
#[derive(Clone, Debug)]
pub struct SqlitePool {
    database_url: String,
}

impl SqlitePool {
    /// Create a new SQLite pool.
    pub fn new(database_url: &str) -> Self {
        // Strip sqlite: prefix if present
        let url = database_url.strip_prefix("sqlite:").unwrap_or(database_url);
        Self {
            database_url: url.to_string(),
        }
    }

    /// Get a connection.
    ///
    /// Concurrent runs write from separate connections, so each one waits on
    /// a locked database instead of failing immediately.
    pub async fn get(&self) -> Result<SqliteConn, DieselError> {
        let mut conn = SqliteConn::establish(&self.database_url)
            .await
            .map_err(to_diesel_error)?;
        conn.batch_execute("PRAGMA busy_timeout = 5000;").await?;
        Ok(conn)
    }

    /// Get the database URL.
    pub fn database_url(&self) -> &str {
        &self.database_url
    }
}

/// Database pool handed to repositories.
#[derive(Clone, Debug)]
pub enum DbPool {
    Sqlite(SqlitePool),
}

impl DbPool {
    /// Create a pool from a database URL (`sqlite:` prefix optional).
    pub fn from_url(url: &str) -> Self {
        DbPool::Sqlite(SqlitePool::new(url))
    }

    /// Check if this is a SQLite backend.
    pub fn is_sqlite(&self) -> bool {
        matches!(self, DbPool::Sqlite(_))
    }
}

/// Macro for running database operations against a pooled connection.
///
/// # Example
/// ```ignore
/// with_conn!(self.pool, conn, {
///     sources::table.load::<SourceRecord>(&mut conn).await
/// })
/// ```
#[macro_export]
macro_rules! with_conn {
    ($pool:expr, $conn:ident, $body:block) => {{
        match &$pool {
            $crate::repository::pool::DbPool::Sqlite(pool) => {
                let mut $conn = pool.get().await?;
                $body
            }
        }
    }};
}
