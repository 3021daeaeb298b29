//! Document models for collected Markdown artifacts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// How a document entered the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    /// Produced by the collection pipeline.
    Collection,
    /// Uploaded by a user.
    Upload,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Collection => "collection",
            Self::Upload => "upload",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "collection" => Some(Self::Collection),
            "upload" => Some(Self::Upload),
            _ => None,
        }
    }
}

/// The current version of a logical document, identified by (source, url).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub source_id: String,
    /// Origin URL the content was collected from.
    pub url: String,
    pub title: String,
    /// Markdown body.
    pub content: String,
    /// Fingerprint of the current version.
    pub content_hash: String,
    pub file_type: FileType,
    /// Set for video sources; the URL is embedded verbatim, never downloaded.
    pub video_url: Option<String>,
    /// Current version number, starting at 1.
    pub version: i32,
    pub summary: Option<String>,
    pub tags: Vec<String>,
    /// Archive location of the Markdown file, relative to the collections dir.
    pub file_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Build an unsaved collection document. Version and timestamps are
    /// assigned by the version store.
    pub fn new(source_id: &str, url: &str, title: &str, content: String) -> Self {
        let now = Utc::now();
        let content_hash = Self::fingerprint(title, &content);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            source_id: source_id.to_string(),
            url: url.to_string(),
            title: title.to_string(),
            content,
            content_hash,
            file_type: FileType::Collection,
            video_url: None,
            version: 1,
            summary: None,
            tags: Vec::new(),
            file_path: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Compute the content fingerprint: SHA-256 over the whitespace-normalized
    /// body and the title.
    pub fn fingerprint(title: &str, body: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(normalize_whitespace(title).as_bytes());
        hasher.update(b"\n");
        hasher.update(normalize_whitespace(body).as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Collapse every whitespace run to a single space and trim the ends.
fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A historical snapshot of a document. History is additive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentVersion {
    pub document_id: String,
    pub version: i32,
    pub title: String,
    pub content: String,
    pub content_hash: String,
    pub created_at: DateTime<Utc>,
}

impl DocumentVersion {
    /// Snapshot the current state of a document.
    pub fn from_document(doc: &Document) -> Self {
        Self {
            document_id: doc.id.clone(),
            version: doc.version,
            title: doc.title.clone(),
            content: doc.content.clone(),
            content_hash: doc.content_hash.clone(),
            created_at: doc.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_sha256_hex() {
        let hash = Document::fingerprint("Title", "Body");
        assert_eq!(hash.len(), 64);
    }

    #[test]
    fn test_fingerprint_ignores_whitespace_layout() {
        let a = Document::fingerprint("Title", "# Heading\n\nSome   text\n");
        let b = Document::fingerprint(" Title ", "# Heading\nSome text");
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_covers_title() {
        let a = Document::fingerprint("One", "Same body");
        let b = Document::fingerprint("Two", "Same body");
        assert_ne!(a, b);
    }

    #[test]
    fn test_new_document_hash_matches_content() {
        let doc = Document::new("src", "https://example.com/a", "A", "Body".to_string());
        assert_eq!(doc.content_hash, Document::fingerprint("A", "Body"));
        assert_eq!(doc.version, 1);
        assert_eq!(doc.file_type, FileType::Collection);
    }
}
