//! In-memory version store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{plan_upsert, StoreError, UpsertResult, VersionStore};
use crate::models::{Document, DocumentVersion};

#[derive(Default)]
struct Inner {
    /// Current documents by id.
    documents: HashMap<String, Document>,
    /// (source_id, url) -> document id.
    index: HashMap<(String, String), String>,
    /// document id -> versions, oldest first.
    versions: HashMap<String, Vec<DocumentVersion>>,
}

/// Version store kept entirely in memory. Used by tests and dry runs.
#[derive(Default)]
pub struct MemoryVersionStore {
    inner: RwLock<Inner>,
}

impl MemoryVersionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of logical documents stored.
    pub async fn len(&self) -> usize {
        self.inner.read().await.documents.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl VersionStore for MemoryVersionStore {
    async fn current(&self, source_id: &str, url: &str) -> Result<Option<Document>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .index
            .get(&(source_id.to_string(), url.to_string()))
            .and_then(|id| inner.documents.get(id))
            .cloned())
    }

    async fn upsert(&self, doc: Document) -> Result<UpsertResult, StoreError> {
        let mut inner = self.inner.write().await;
        let key = (doc.source_id.clone(), doc.url.clone());
        let current = inner
            .index
            .get(&key)
            .and_then(|id| inner.documents.get(id))
            .cloned();

        let (outcome, document) = plan_upsert(current.as_ref(), doc);
        if outcome.is_write() {
            inner
                .versions
                .entry(document.id.clone())
                .or_default()
                .push(DocumentVersion::from_document(&document));
            inner.index.insert(key, document.id.clone());
            inner
                .documents
                .insert(document.id.clone(), document.clone());
        }

        Ok(UpsertResult { outcome, document })
    }

    async fn get(&self, document_id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.inner.read().await.documents.get(document_id).cloned())
    }

    async fn get_version(
        &self,
        document_id: &str,
        version: i32,
    ) -> Result<Option<DocumentVersion>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .versions
            .get(document_id)
            .and_then(|vs| vs.iter().find(|v| v.version == version))
            .cloned())
    }

    async fn versions(&self, document_id: &str) -> Result<Vec<DocumentVersion>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .versions
            .get(document_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::VersionOutcome;

    fn doc(body: &str) -> Document {
        Document::new("blog", "https://example.com/post", "Post", body.to_string())
    }

    #[tokio::test]
    async fn test_created_then_unchanged() {
        let store = MemoryVersionStore::new();

        let first = store.upsert(doc("hello world")).await.unwrap();
        assert_eq!(first.outcome, VersionOutcome::Created);
        assert_eq!(first.document.version, 1);

        let second = store.upsert(doc("hello   world\n")).await.unwrap();
        assert_eq!(second.outcome, VersionOutcome::Unchanged);
        assert_eq!(second.document.version, 1);
        assert_eq!(second.document.updated_at, first.document.updated_at);
        assert_eq!(store.versions(&first.document.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_updated_keeps_history() {
        let store = MemoryVersionStore::new();
        let first = store.upsert(doc("original")).await.unwrap();
        let second = store.upsert(doc("revised")).await.unwrap();

        assert_eq!(second.outcome, VersionOutcome::Updated);
        assert_eq!(second.document.id, first.document.id);
        assert_eq!(second.document.version, 2);

        let v1 = store
            .get_version(&first.document.id, 1)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(v1.content, "original");
        assert_eq!(v1.content_hash, first.document.content_hash);

        let current = store
            .current("blog", "https://example.com/post")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.content, "revised");
        assert_eq!(store.len().await, 1);
    }
}
