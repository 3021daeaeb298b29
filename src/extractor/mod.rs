//! Content-region extraction from fetched HTML.
//!
//! Explicit selectors win when configured. Otherwise a fixed list of common
//! article containers is scored by visible text length and the best one is
//! kept, with `body` as the last resort.

mod clean;
mod metadata;

pub use clean::{clean_html, clean_text, collapse_whitespace, STRIP_SELECTORS};
pub use metadata::{extract_metadata, extract_title, title_from_url, PageMetadata, UNTITLED};

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::SourceConfig;

/// Container candidates in priority order.
pub const CONTENT_CANDIDATES: &[&str] = &[
    "article",
    ".article-content",
    ".post-content",
    ".entry-content",
    ".content",
    "main",
    "#content",
    "#main-content",
];

const FALLBACK_CANDIDATE: &str = "body";

/// Errors raised while locating the content region.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("no content found (best candidate had {best} characters, need {required})")]
    NoContentFound { best: usize, required: usize },
    #[error("invalid selector: {0}")]
    InvalidSelector(String),
}

/// The cleaned main content of a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedContent {
    pub title: String,
    /// Cleaned HTML of the winning region; empty for video pages.
    pub html: String,
    /// Visible character count of the winning region.
    pub text_length: usize,
    /// URL the page was fetched from, used to resolve relative links.
    pub page_url: String,
    pub metadata: PageMetadata,
    /// Selector that produced the content.
    pub matched_by: Option<String>,
}

/// A scored candidate region.
struct Candidate<'a> {
    element: ElementRef<'a>,
    selector: &'a str,
    score: usize,
}

/// Extraction rules compiled from a source configuration.
#[derive(Debug)]
pub struct Extractor {
    title_selector: Option<Selector>,
    content_selector: Option<(String, Selector)>,
    min_content_length: usize,
}

impl Extractor {
    /// Compile the configured selectors.
    pub fn from_config(config: &SourceConfig) -> Result<Self, ExtractionError> {
        Ok(Self {
            title_selector: compile(config.selectors.title.as_deref())?.map(|(_, s)| s),
            content_selector: compile(config.selectors.content.as_deref())?,
            min_content_length: config.min_content_length,
        })
    }

    /// Locate, score and clean the main content region.
    pub fn extract(&self, raw_html: &str, page_url: &str) -> Result<ExtractedContent, ExtractionError> {
        let document = Html::parse_document(raw_html);
        let title = extract_title(&document, self.title_selector.as_ref(), page_url);

        let winner = self
            .explicit_candidate(&document)
            .or_else(|| best_candidate(&document, CONTENT_CANDIDATES, self.min_content_length))
            .or_else(|| best_candidate(&document, &[FALLBACK_CANDIDATE], 0));

        let best = winner.as_ref().map(|c| c.score).unwrap_or(0);
        let Some(winner) = winner.filter(|c| c.score >= self.min_content_length) else {
            return Err(ExtractionError::NoContentFound {
                best,
                required: self.min_content_length,
            });
        };

        debug!(
            "Extracted {} characters from {} via '{}'",
            winner.score, page_url, winner.selector
        );

        Ok(ExtractedContent {
            title,
            html: clean_html(winner.element),
            text_length: winner.score,
            page_url: page_url.to_string(),
            metadata: extract_metadata(&document),
            matched_by: Some(winner.selector.to_string()),
        })
    }

    /// Title and metadata only, for pages whose content is not HTML text.
    pub fn extract_metadata_only(&self, raw_html: &str, page_url: &str) -> ExtractedContent {
        let document = Html::parse_document(raw_html);
        ExtractedContent {
            title: extract_title(&document, self.title_selector.as_ref(), page_url),
            html: String::new(),
            text_length: 0,
            page_url: page_url.to_string(),
            metadata: extract_metadata(&document),
            matched_by: None,
        }
    }

    fn explicit_candidate<'a>(&'a self, document: &'a Html) -> Option<Candidate<'a>> {
        let (css, selector) = self.content_selector.as_ref()?;
        let element = document.select(selector).next();
        if element.is_none() {
            debug!("Configured content selector '{}' matched nothing", css);
        }
        element.map(|element| Candidate {
            element,
            selector: css.as_str(),
            score: score(element),
        })
    }
}

/// Convenience wrapper compiling `config` for a single page.
pub fn extract(
    raw_html: &str,
    config: &SourceConfig,
    page_url: &str,
) -> Result<ExtractedContent, ExtractionError> {
    Extractor::from_config(config)?.extract(raw_html, page_url)
}

/// Highest-scoring match across `candidates`; ties keep the earlier one.
///
/// Returns `None` when nothing reaches `threshold`.
fn best_candidate<'a>(
    document: &'a Html,
    candidates: &[&'a str],
    threshold: usize,
) -> Option<Candidate<'a>> {
    let mut best: Option<Candidate<'a>> = None;
    for &css in candidates {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };
        for element in document.select(&selector) {
            let score = score(element);
            if best.as_ref().map_or(true, |b| score > b.score) {
                best = Some(Candidate {
                    element,
                    selector: css,
                    score,
                });
            }
        }
    }
    best.filter(|c| c.score >= threshold)
}

/// Visible characters after noise stripping.
fn score(element: ElementRef<'_>) -> usize {
    clean_text(element).chars().count()
}

fn compile(raw: Option<&str>) -> Result<Option<(String, Selector)>, ExtractionError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(css) => Selector::parse(css)
            .map(|s| Some((css.to_string(), s)))
            .map_err(|_| ExtractionError::InvalidSelector(css.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SelectorConfig;

    const URL: &str = "https://example.com/posts/hello-world";

    fn lorem(words: usize) -> String {
        (0..words).map(|i| format!("word{}", i)).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_auto_detect_prefers_richest_container() {
        let html = format!(
            r#"<html><body>
                <header>Site header with lots of navigation text</header>
                <div class="content">{}</div>
                <article><h1>Hello</h1><p>{}</p></article>
                <footer>Footer</footer>
            </body></html>"#,
            lorem(5),
            lorem(40)
        );
        let extracted = extract(&html, &SourceConfig::default(), URL).unwrap();
        assert_eq!(extracted.matched_by.as_deref(), Some("article"));
        assert_eq!(extracted.title, "Hello");
        assert!(extracted.html.starts_with("<article>"));
        assert!(extracted.text_length >= 50);
    }

    #[test]
    fn test_tie_keeps_earlier_candidate() {
        let text = lorem(20);
        let html = format!(
            r#"<html><body><main>{text}</main><div id="content">{text}</div></body></html>"#
        );
        let extracted = extract(&html, &SourceConfig::default(), URL).unwrap();
        assert_eq!(extracted.matched_by.as_deref(), Some("main"));
    }

    #[test]
    fn test_body_fallback() {
        let html = format!("<html><body><div><p>{}</p></div></body></html>", lorem(30));
        let extracted = extract(&html, &SourceConfig::default(), URL).unwrap();
        assert_eq!(extracted.matched_by.as_deref(), Some("body"));
    }

    #[test]
    fn test_below_threshold_is_no_content() {
        let html = "<html><body><article><p>Too short.</p></article></body></html>";
        let err = extract(html, &SourceConfig::default(), URL).unwrap_err();
        assert_eq!(
            err,
            ExtractionError::NoContentFound {
                best: 10,
                required: 50
            }
        );
    }

    #[test]
    fn test_stripped_regions_do_not_count() {
        let html = format!(
            r#"<html><body><article><p>Short body.</p><div class="comments">{}</div></article></body></html>"#,
            lorem(50)
        );
        let err = extract(&html, &SourceConfig::default(), URL).unwrap_err();
        assert!(matches!(err, ExtractionError::NoContentFound { .. }));
    }

    #[test]
    fn test_explicit_selectors() {
        let html = format!(
            r#"<html><body><h1>Site</h1><span class="headline">Real Title</span>
               <div class="story">{}</div><article>{}</article></body></html>"#,
            lorem(15),
            lorem(60)
        );
        let config = SourceConfig {
            selectors: SelectorConfig {
                title: Some(".headline".into()),
                content: Some(".story".into()),
                search_result_link: None,
            },
            ..Default::default()
        };
        let extracted = extract(&html, &config, URL).unwrap();
        assert_eq!(extracted.title, "Real Title");
        assert_eq!(extracted.matched_by.as_deref(), Some(".story"));
    }

    #[test]
    fn test_invalid_selector() {
        let config = SourceConfig {
            selectors: SelectorConfig {
                content: Some("div[".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let err = Extractor::from_config(&config).unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidSelector(_)));
    }

    #[test]
    fn test_metadata_only() {
        let html = r#"<html><head><meta property="og:title" content="Clip"><meta name="description" content="Fun"></head><body></body></html>"#;
        let extractor = Extractor::from_config(&SourceConfig::default()).unwrap();
        let extracted = extractor.extract_metadata_only(html, "https://videos.example.com/v/1");
        assert_eq!(extracted.title, "Clip");
        assert!(extracted.html.is_empty());
        assert_eq!(extracted.metadata.description.as_deref(), Some("Fun"));
    }
}
