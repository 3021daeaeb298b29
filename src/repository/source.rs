//! Diesel-based source repository.

use std::collections::BTreeMap;

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::models::{NewSource, SourceRecord};
use super::parse_datetime;
use super::pool::{DbPool, DieselError};
use super::util::{json_error, to_diesel_error};
use crate::models::{CollectionSource, SourceType};
use crate::schema::sources;
use crate::with_conn;

/// Convert a database record to a domain model.
impl TryFrom<SourceRecord> for CollectionSource {
    type Error = DieselError;

    fn try_from(record: SourceRecord) -> Result<Self, Self::Error> {
        let config = serde_json::from_str(&record.config).map_err(json_error)?;
        let search_params: BTreeMap<String, String> =
            serde_json::from_str(&record.search_params).map_err(json_error)?;
        let source_type = SourceType::from_str(&record.source_type).ok_or_else(|| {
            to_diesel_error(format!("unknown source type: {}", record.source_type))
        })?;

        Ok(CollectionSource {
            id: record.id,
            name: record.name,
            url_pattern: record.url_pattern,
            source_type,
            enabled: record.enabled != 0,
            config,
            search_params,
            created_at: parse_datetime(&record.created_at),
            updated_at: parse_datetime(&record.updated_at),
        })
    }
}

/// Diesel-based source repository.
#[derive(Clone)]
pub struct DieselSourceRepository {
    pool: DbPool,
}

impl DieselSourceRepository {
    /// Create a new Diesel source repository with an existing pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a source by ID.
    pub async fn get(&self, id: &str) -> Result<Option<CollectionSource>, DieselError> {
        with_conn!(self.pool, conn, {
            sources::table
                .find(id)
                .first::<SourceRecord>(&mut conn)
                .await
                .optional()
                .and_then(|opt| opt.map(CollectionSource::try_from).transpose())
        })
    }

    /// Get all sources, ordered by creation time.
    pub async fn get_all(&self) -> Result<Vec<CollectionSource>, DieselError> {
        with_conn!(self.pool, conn, {
            sources::table
                .order(sources::created_at.asc())
                .load::<SourceRecord>(&mut conn)
                .await
                .and_then(|records| {
                    records
                        .into_iter()
                        .map(CollectionSource::try_from)
                        .collect()
                })
        })
    }

    /// Get all enabled sources.
    pub async fn get_enabled(&self) -> Result<Vec<CollectionSource>, DieselError> {
        with_conn!(self.pool, conn, {
            sources::table
                .filter(sources::enabled.ne(0))
                .order(sources::created_at.asc())
                .load::<SourceRecord>(&mut conn)
                .await
                .and_then(|records| {
                    records
                        .into_iter()
                        .map(CollectionSource::try_from)
                        .collect()
                })
        })
    }

    /// Save a source (insert or update).
    pub async fn save(&self, source: &CollectionSource) -> Result<(), DieselError> {
        let config = serde_json::to_string(&source.config).unwrap_or_else(|_| "{}".to_string());
        let search_params =
            serde_json::to_string(&source.search_params).unwrap_or_else(|_| "{}".to_string());
        let created_at = source.created_at.to_rfc3339();
        let updated_at = source.updated_at.to_rfc3339();

        let row = NewSource {
            id: &source.id,
            name: &source.name,
            url_pattern: &source.url_pattern,
            source_type: source.source_type.as_str(),
            enabled: i32::from(source.enabled),
            config: &config,
            search_params: &search_params,
            created_at: &created_at,
            updated_at: &updated_at,
        };

        with_conn!(self.pool, conn, {
            diesel::replace_into(sources::table)
                .values(&row)
                .execute(&mut conn)
                .await?;
            Ok(())
        })
    }

    /// Enable or disable a source. Returns false if it does not exist.
    pub async fn set_enabled(&self, id: &str, enabled: bool) -> Result<bool, DieselError> {
        let updated_at = Utc::now().to_rfc3339();
        with_conn!(self.pool, conn, {
            let rows = diesel::update(sources::table.find(id))
                .set((
                    sources::enabled.eq(i32::from(enabled)),
                    sources::updated_at.eq(&updated_at),
                ))
                .execute(&mut conn)
                .await?;
            Ok(rows > 0)
        })
    }

    /// Delete a source. Documents collected from it are kept.
    pub async fn delete(&self, id: &str) -> Result<bool, DieselError> {
        with_conn!(self.pool, conn, {
            let rows = diesel::delete(sources::table.find(id))
                .execute(&mut conn)
                .await?;
            Ok(rows > 0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::DbContext;
    use tempfile::tempdir;

    async fn setup_test_db() -> (DbContext, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let ctx = DbContext::from_url(&dir.path().join("test.db").display().to_string());
        ctx.init_schema().await.unwrap();
        (ctx, dir)
    }

    #[tokio::test]
    async fn test_source_crud() {
        let (ctx, _dir) = setup_test_db().await;
        let repo = ctx.sources();

        let mut source = CollectionSource::new(
            "news".to_string(),
            "News".to_string(),
            "https://example.com/news".to_string(),
            SourceType::Webpage,
        );
        source.config = serde_json::json!({ "use_selenium": true });
        source
            .search_params
            .insert("q".to_string(), "rust".to_string());
        repo.save(&source).await.unwrap();

        let loaded = repo.get("news").await.unwrap().unwrap();
        assert_eq!(loaded.name, "News");
        assert!(loaded.enabled);
        assert_eq!(loaded.config["use_selenium"], serde_json::json!(true));
        assert_eq!(loaded.search_params.get("q").map(String::as_str), Some("rust"));

        assert!(repo.set_enabled("news", false).await.unwrap());
        assert!(repo.get_enabled().await.unwrap().is_empty());
        assert_eq!(repo.get_all().await.unwrap().len(), 1);

        source.name = "World News".to_string();
        repo.save(&source).await.unwrap();
        assert_eq!(repo.get("news").await.unwrap().unwrap().name, "World News");

        assert!(repo.delete("news").await.unwrap());
        assert!(repo.get("news").await.unwrap().is_none());
        assert!(!repo.delete("news").await.unwrap());
    }
}
