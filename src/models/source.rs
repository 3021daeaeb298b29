//! Collection source models.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of content a source produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Webpage,
    Video,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Webpage => "webpage",
            Self::Video => "video",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "webpage" => Some(Self::Webpage),
            "video" => Some(Self::Video),
            _ => None,
        }
    }
}

/// A configured origin to collect content from.
///
/// `config` is kept as the raw JSON the administrator supplied; it is turned
/// into a validated [`SourceConfig`](crate::config::SourceConfig) whenever a
/// run is triggered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionSource {
    /// Unique identifier for this source.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Literal URL, or search page template when `search_params` is set.
    pub url_pattern: String,
    /// Type of content collected.
    pub source_type: SourceType,
    /// Disabled sources are never collected.
    pub enabled: bool,
    /// Raw extraction configuration.
    pub config: serde_json::Value,
    /// Query parameters merged into `url_pattern` for search pages.
    pub search_params: BTreeMap<String, String>,
    /// When the source was added.
    pub created_at: DateTime<Utc>,
    /// When the source was last modified.
    pub updated_at: DateTime<Utc>,
}

impl CollectionSource {
    /// Create a new enabled source with an empty configuration.
    pub fn new(id: String, name: String, url_pattern: String, source_type: SourceType) -> Self {
        let now = Utc::now();
        Self {
            id,
            name,
            url_pattern,
            source_type,
            enabled: true,
            config: serde_json::json!({}),
            search_params: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this source discovers its URLs from a search results page.
    pub fn is_search(&self) -> bool {
        !self.search_params.is_empty()
            || self
                .config
                .pointer("/selectors/search_result_link")
                .and_then(|v| v.as_str())
                .is_some_and(|s| !s.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_type_roundtrip() {
        for ty in [SourceType::Webpage, SourceType::Video] {
            assert_eq!(SourceType::from_str(ty.as_str()), Some(ty));
        }
        assert_eq!(SourceType::from_str("podcast"), None);
    }

    #[test]
    fn test_is_search() {
        let mut source = CollectionSource::new(
            "blog".to_string(),
            "Blog".to_string(),
            "https://example.com/post/1".to_string(),
            SourceType::Webpage,
        );
        assert!(!source.is_search());

        source.config = serde_json::json!({ "selectors": { "search_result_link": "a.result" } });
        assert!(source.is_search());

        source.config = serde_json::json!({});
        source
            .search_params
            .insert("q".to_string(), "rust".to_string());
        assert!(source.is_search());
    }
}
