//! Per-source extraction and rendering configuration.
//!
//! Sources store their configuration as free-form JSON. Before a run starts
//! it is parsed into [`SourceConfig`] and validated, so bad selectors or
//! out-of-range timeouts are reported to the caller instead of failing
//! halfway through a run.

use std::path::PathBuf;

use scraper::Selector;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors surfaced at trigger time.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid source configuration: {0}")]
    Malformed(String),

    #[error("invalid selector for {field}: {selector:?}")]
    InvalidSelector { field: &'static str, selector: String },

    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: String },
}

/// Headless browser engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    #[default]
    Chrome,
    Edge,
    Firefox,
}

impl BrowserKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chrome => "chrome",
            Self::Edge => "edge",
            Self::Firefox => "firefox",
        }
    }
}

/// Rendered-fetch settings (`selenium_config`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default)]
    pub browser: BrowserKind,

    #[serde(default = "default_true")]
    pub headless: bool,

    /// Readiness wait ceiling in seconds.
    #[serde(default = "default_wait_timeout")]
    pub wait_timeout: u64,

    /// Comma-separated selectors; the first one that appears ends the wait.
    #[serde(default)]
    pub content_wait_selector: Option<String>,

    #[serde(default = "default_true")]
    pub scroll_to_load: bool,

    /// Grace sleep after readiness, in seconds.
    #[serde(default = "default_extra_wait")]
    pub extra_wait_time: f64,

    /// Browser executable. Auto-detected when unset.
    #[serde(default)]
    pub driver_path: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            browser: BrowserKind::default(),
            headless: true,
            wait_timeout: default_wait_timeout(),
            content_wait_selector: None,
            scroll_to_load: true,
            extra_wait_time: default_extra_wait(),
            driver_path: None,
        }
    }
}

impl RenderConfig {
    /// Individual selectors from `content_wait_selector`.
    pub fn content_wait_selectors(&self) -> Vec<&str> {
        split_selectors(self.content_wait_selector.as_deref())
    }
}

/// Explicit extraction selectors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectorConfig {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub search_result_link: Option<String>,
}

/// Validated per-source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Fetch pages through a headless browser instead of plain HTTP.
    #[serde(default)]
    pub use_selenium: bool,

    #[serde(default)]
    pub selenium_config: RenderConfig,

    #[serde(default)]
    pub selectors: SelectorConfig,

    /// Selector awaited on search result pages.
    #[serde(default)]
    pub search_wait_selector: Option<String>,

    /// Upper bound on links discovered from one search page.
    #[serde(default = "default_max_links")]
    pub max_links: usize,

    /// Minimum visible text length for auto-detected content.
    #[serde(default = "default_min_content_length")]
    pub min_content_length: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            use_selenium: false,
            selenium_config: RenderConfig::default(),
            selectors: SelectorConfig::default(),
            search_wait_selector: None,
            max_links: default_max_links(),
            min_content_length: default_min_content_length(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_wait_timeout() -> u64 {
    15
}

fn default_extra_wait() -> f64 {
    2.0
}

fn default_max_links() -> usize {
    50
}

fn default_min_content_length() -> usize {
    50
}

impl SourceConfig {
    /// Parse and validate a source's raw JSON configuration.
    ///
    /// `null` and `{}` both yield the defaults.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, ConfigError> {
        let config: SourceConfig = match value {
            serde_json::Value::Null => SourceConfig::default(),
            serde_json::Value::Object(_) => serde_json::from_value(value.clone())
                .map_err(|e| ConfigError::Malformed(e.to_string()))?,
            other => {
                return Err(ConfigError::Malformed(format!(
                    "expected a JSON object, got {}",
                    other
                )))
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Check selectors and numeric ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_selector("selectors.title", self.selectors.title.as_deref())?;
        check_selector("selectors.content", self.selectors.content.as_deref())?;
        check_selector(
            "selectors.search_result_link",
            self.selectors.search_result_link.as_deref(),
        )?;
        check_selector("search_wait_selector", self.search_wait_selector.as_deref())?;
        for selector in self.selenium_config.content_wait_selectors() {
            check_selector("selenium_config.content_wait_selector", Some(selector))?;
        }

        let render = &self.selenium_config;
        if !(1..=300).contains(&render.wait_timeout) {
            return Err(ConfigError::OutOfRange {
                field: "selenium_config.wait_timeout",
                value: render.wait_timeout.to_string(),
            });
        }
        if !(0.0..=60.0).contains(&render.extra_wait_time) {
            return Err(ConfigError::OutOfRange {
                field: "selenium_config.extra_wait_time",
                value: render.extra_wait_time.to_string(),
            });
        }
        if !(1..=500).contains(&self.max_links) {
            return Err(ConfigError::OutOfRange {
                field: "max_links",
                value: self.max_links.to_string(),
            });
        }
        Ok(())
    }
}

/// Split a comma-separated selector list, dropping empty entries.
pub fn split_selectors(raw: Option<&str>) -> Vec<&str> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

fn check_selector(field: &'static str, selector: Option<&str>) -> Result<(), ConfigError> {
    match selector.map(str::trim) {
        None | Some("") => Ok(()),
        Some(s) => Selector::parse(s)
            .map(|_| ())
            .map_err(|_| ConfigError::InvalidSelector {
                field,
                selector: s.to_string(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_from_null_and_empty() {
        for value in [json!(null), json!({})] {
            let config = SourceConfig::from_value(&value).unwrap();
            assert!(!config.use_selenium);
            assert_eq!(config.selenium_config.browser, BrowserKind::Chrome);
            assert!(config.selenium_config.headless);
            assert_eq!(config.selenium_config.wait_timeout, 15);
            assert!(config.selenium_config.scroll_to_load);
            assert_eq!(config.max_links, 50);
        }
    }

    #[test]
    fn test_full_config() {
        let value = json!({
            "use_selenium": true,
            "selenium_config": {
                "browser": "edge",
                "headless": false,
                "wait_timeout": 30,
                "content_wait_selector": ".article, #main",
                "scroll_to_load": false,
                "extra_wait_time": 0.5
            },
            "selectors": { "title": "h1.title", "content": "div.body" },
            "search_wait_selector": ".results"
        });
        let config = SourceConfig::from_value(&value).unwrap();
        assert!(config.use_selenium);
        assert_eq!(config.selenium_config.browser, BrowserKind::Edge);
        assert_eq!(
            config.selenium_config.content_wait_selectors(),
            vec![".article", "#main"]
        );
        assert_eq!(config.selectors.content.as_deref(), Some("div.body"));
    }

    #[test]
    fn test_unknown_browser_rejected() {
        let value = json!({ "selenium_config": { "browser": "netscape" } });
        assert!(matches!(
            SourceConfig::from_value(&value),
            Err(ConfigError::Malformed(_))
        ));
    }

    #[test]
    fn test_bad_selector_rejected() {
        let value = json!({ "selectors": { "content": "div[[" } });
        assert!(matches!(
            SourceConfig::from_value(&value),
            Err(ConfigError::InvalidSelector { field: "selectors.content", .. })
        ));
    }

    #[test]
    fn test_timeout_out_of_range() {
        let value = json!({ "selenium_config": { "wait_timeout": 0 } });
        assert!(matches!(
            SourceConfig::from_value(&value),
            Err(ConfigError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(SourceConfig::from_value(&json!("use_selenium")).is_err());
    }
}
