//! Version store: fingerprint-based change detection for documents.
//!
//! A logical document is identified by (source, origin URL). Upserting
//! compares the new fingerprint with the current version and either creates
//! the document, leaves it untouched, or appends a new version.

mod memory;

pub use memory::MemoryVersionStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Document, DocumentVersion};

/// Errors from the version store. Any of these is fatal to a run.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("version store unavailable: {0}")]
    Unavailable(String),

    #[error("stored data is corrupt: {0}")]
    Corrupt(String),
}

impl From<diesel::result::Error> for StoreError {
    fn from(e: diesel::result::Error) -> Self {
        match e {
            diesel::result::Error::DeserializationError(inner) => {
                StoreError::Corrupt(inner.to_string())
            }
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

/// What an upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionOutcome {
    /// First time this (source, url) was stored; version 1 written.
    Created,
    /// Fingerprint matched the current version; nothing written.
    Unchanged,
    /// Fingerprint differed; a new version was appended.
    Updated,
}

impl VersionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Unchanged => "unchanged",
            Self::Updated => "updated",
        }
    }

    /// Whether the upsert wrote anything.
    pub fn is_write(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Outcome plus the document as it now stands in the store.
#[derive(Debug, Clone)]
pub struct UpsertResult {
    pub outcome: VersionOutcome,
    pub document: Document,
}

/// Persistence for versioned documents.
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Current version of the document collected from `url` by `source_id`.
    async fn current(&self, source_id: &str, url: &str) -> Result<Option<Document>, StoreError>;

    /// Store `doc` if its fingerprint differs from the current version.
    ///
    /// `doc.content_hash` must already be the fingerprint of its title and
    /// content. The id, version and timestamps of `doc` are ignored in favour
    /// of the stored ones.
    async fn upsert(&self, doc: Document) -> Result<UpsertResult, StoreError>;

    /// Fetch a document by id.
    async fn get(&self, document_id: &str) -> Result<Option<Document>, StoreError>;

    /// A specific historical version.
    async fn get_version(
        &self,
        document_id: &str,
        version: i32,
    ) -> Result<Option<DocumentVersion>, StoreError>;

    /// All versions of a document, oldest first.
    async fn versions(&self, document_id: &str) -> Result<Vec<DocumentVersion>, StoreError>;
}

/// Decide what an upsert should do given the current version.
///
/// Shared by every store so the comparison rule lives in one place.
pub(crate) fn plan_upsert(current: Option<&Document>, mut incoming: Document) -> (VersionOutcome, Document) {
    let now = chrono::Utc::now();
    match current {
        None => {
            incoming.version = 1;
            incoming.created_at = now;
            incoming.updated_at = now;
            (VersionOutcome::Created, incoming)
        }
        Some(existing) if existing.content_hash == incoming.content_hash => {
            (VersionOutcome::Unchanged, existing.clone())
        }
        Some(existing) => {
            incoming.id = existing.id.clone();
            incoming.version = existing.version + 1;
            incoming.created_at = existing.created_at;
            incoming.updated_at = now;
            (VersionOutcome::Updated, incoming)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(body: &str) -> Document {
        Document::new("src", "https://example.com/a", "Title", body.to_string())
    }

    #[test]
    fn test_plan_created() {
        let (outcome, planned) = plan_upsert(None, doc("body"));
        assert_eq!(outcome, VersionOutcome::Created);
        assert_eq!(planned.version, 1);
    }

    #[test]
    fn test_plan_unchanged_keeps_existing() {
        let existing = doc("body");
        let (outcome, planned) = plan_upsert(Some(&existing), doc("body"));
        assert_eq!(outcome, VersionOutcome::Unchanged);
        assert_eq!(planned.id, existing.id);
        assert_eq!(planned.updated_at, existing.updated_at);
    }

    #[test]
    fn test_plan_updated_increments() {
        let mut existing = doc("body");
        existing.version = 4;
        let (outcome, planned) = plan_upsert(Some(&existing), doc("changed body"));
        assert_eq!(outcome, VersionOutcome::Updated);
        assert_eq!(planned.version, 5);
        assert_eq!(planned.id, existing.id);
        assert_eq!(planned.created_at, existing.created_at);
    }
}
