//! Diesel-based document repository and version store.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};

use super::models::{DocumentRecord, DocumentVersionRecord, NewDocument, NewDocumentVersion};
use super::pool::{DbPool, DieselError};
use super::parse_datetime;
use super::util::json_error;
use crate::models::{Document, DocumentVersion, FileType};
use crate::schema::{document_versions, documents};
use crate::store::{plan_upsert, StoreError, UpsertResult, VersionOutcome, VersionStore};
use crate::with_conn;

/// Convert a database record to a domain model.
impl TryFrom<DocumentRecord> for Document {
    type Error = DieselError;

    fn try_from(record: DocumentRecord) -> Result<Self, Self::Error> {
        let tags: Vec<String> = serde_json::from_str(&record.tags).map_err(json_error)?;

        Ok(Document {
            id: record.id,
            source_id: record.source_id,
            url: record.url,
            title: record.title,
            content: record.content,
            content_hash: record.content_hash,
            file_type: FileType::from_str(&record.file_type).unwrap_or(FileType::Collection),
            video_url: record.video_url,
            version: record.version,
            summary: record.summary,
            tags,
            file_path: record.file_path,
            created_at: parse_datetime(&record.created_at),
            updated_at: parse_datetime(&record.updated_at),
        })
    }
}

impl From<DocumentVersionRecord> for DocumentVersion {
    fn from(record: DocumentVersionRecord) -> Self {
        DocumentVersion {
            document_id: record.document_id,
            version: record.version,
            title: record.title,
            content: record.content,
            content_hash: record.content_hash,
            created_at: parse_datetime(&record.created_at),
        }
    }
}

/// Diesel-based document repository with compile-time query checking.
#[derive(Clone)]
pub struct DieselDocumentRepository {
    pool: DbPool,
}

impl DieselDocumentRepository {
    /// Create a new Diesel document repository with an existing pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a document by ID.
    pub async fn get(&self, id: &str) -> Result<Option<Document>, DieselError> {
        with_conn!(self.pool, conn, {
            documents::table
                .find(id)
                .first::<DocumentRecord>(&mut conn)
                .await
                .optional()
                .and_then(|opt| opt.map(Document::try_from).transpose())
        })
    }

    /// Get the current document for (source, url).
    pub async fn get_by_url(
        &self,
        source_id: &str,
        url: &str,
    ) -> Result<Option<Document>, DieselError> {
        with_conn!(self.pool, conn, {
            documents::table
                .filter(documents::source_id.eq(source_id))
                .filter(documents::url.eq(url))
                .first::<DocumentRecord>(&mut conn)
                .await
                .optional()
                .and_then(|opt| opt.map(Document::try_from).transpose())
        })
    }

    /// Get documents for a source, most recently updated first.
    pub async fn get_by_source(
        &self,
        source_id: &str,
        limit: i64,
    ) -> Result<Vec<Document>, DieselError> {
        with_conn!(self.pool, conn, {
            documents::table
                .filter(documents::source_id.eq(source_id))
                .order(documents::updated_at.desc())
                .limit(limit)
                .load::<DocumentRecord>(&mut conn)
                .await
                .and_then(|records| records.into_iter().map(Document::try_from).collect())
        })
    }

    /// Load all versions of a document, oldest first.
    pub async fn load_versions(
        &self,
        document_id: &str,
    ) -> Result<Vec<DocumentVersion>, DieselError> {
        with_conn!(self.pool, conn, {
            let records: Vec<DocumentVersionRecord> = document_versions::table
                .filter(document_versions::document_id.eq(document_id))
                .order(document_versions::version.asc())
                .load(&mut conn)
                .await?;
            Ok(records.into_iter().map(DocumentVersion::from).collect())
        })
    }

    /// Load one version of a document.
    pub async fn load_version(
        &self,
        document_id: &str,
        version: i32,
    ) -> Result<Option<DocumentVersion>, DieselError> {
        with_conn!(self.pool, conn, {
            document_versions::table
                .filter(document_versions::document_id.eq(document_id))
                .filter(document_versions::version.eq(version))
                .first::<DocumentVersionRecord>(&mut conn)
                .await
                .optional()
                .map(|opt| opt.map(DocumentVersion::from))
        })
    }

    /// Insert or update a document together with its version row.
    async fn write(&self, doc: &Document, outcome: VersionOutcome) -> Result<(), DieselError> {
        let tags = serde_json::to_string(&doc.tags).unwrap_or_else(|_| "[]".to_string());
        let created_at = doc.created_at.to_rfc3339();
        let updated_at = doc.updated_at.to_rfc3339();
        let file_type = doc.file_type.as_str();

        with_conn!(self.pool, conn, {
            conn.transaction(|conn| {
                Box::pin(async move {
                    match outcome {
                        VersionOutcome::Created => {
                            diesel::insert_into(documents::table)
                                .values(NewDocument {
                                    id: &doc.id,
                                    source_id: &doc.source_id,
                                    url: &doc.url,
                                    title: &doc.title,
                                    content: &doc.content,
                                    content_hash: &doc.content_hash,
                                    file_type,
                                    video_url: doc.video_url.as_deref(),
                                    version: doc.version,
                                    summary: doc.summary.as_deref(),
                                    tags: &tags,
                                    file_path: doc.file_path.as_deref(),
                                    created_at: &created_at,
                                    updated_at: &updated_at,
                                })
                                .execute(conn)
                                .await?;
                        }
                        VersionOutcome::Updated => {
                            diesel::update(documents::table.find(&doc.id))
                                .set((
                                    documents::title.eq(&doc.title),
                                    documents::content.eq(&doc.content),
                                    documents::content_hash.eq(&doc.content_hash),
                                    documents::video_url.eq(doc.video_url.as_deref()),
                                    documents::version.eq(doc.version),
                                    documents::summary.eq(doc.summary.as_deref()),
                                    documents::tags.eq(&tags),
                                    documents::file_path.eq(doc.file_path.as_deref()),
                                    documents::updated_at.eq(&updated_at),
                                ))
                                .execute(conn)
                                .await?;
                        }
                        VersionOutcome::Unchanged => return Ok(()),
                    }

                    diesel::insert_into(document_versions::table)
                        .values(NewDocumentVersion {
                            document_id: &doc.id,
                            version: doc.version,
                            title: &doc.title,
                            content: &doc.content,
                            content_hash: &doc.content_hash,
                            created_at: &updated_at,
                        })
                        .execute(conn)
                        .await?;
                    Ok(())
                })
            })
            .await
        })
    }
}

#[async_trait]
impl VersionStore for DieselDocumentRepository {
    async fn current(&self, source_id: &str, url: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.get_by_url(source_id, url).await?)
    }

    async fn upsert(&self, doc: Document) -> Result<UpsertResult, StoreError> {
        let current = self.get_by_url(&doc.source_id, &doc.url).await?;
        let (outcome, document) = plan_upsert(current.as_ref(), doc);
        self.write(&document, outcome).await?;
        Ok(UpsertResult { outcome, document })
    }

    async fn get(&self, document_id: &str) -> Result<Option<Document>, StoreError> {
        Ok(DieselDocumentRepository::get(self, document_id).await?)
    }

    async fn get_version(
        &self,
        document_id: &str,
        version: i32,
    ) -> Result<Option<DocumentVersion>, StoreError> {
        Ok(self.load_version(document_id, version).await?)
    }

    async fn versions(&self, document_id: &str) -> Result<Vec<DocumentVersion>, StoreError> {
        Ok(self.load_versions(document_id).await?)
    }
}
