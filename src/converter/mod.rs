//! Canonical Markdown rendering of extracted content.
//!
//! Output is a pure function of the input so that content fingerprints only
//! change when the page really changed.

mod images;
mod markdown;
mod summary;
mod tags;
mod toc;
mod video;

pub use images::{image_filename, normalize_relative, rewrite_images, ImageRef, IMAGES_DIR};
pub use markdown::{html_to_markdown, normalize};
pub use summary::{summarize, MAX_SUMMARY_CHARS};
pub use tags::{extract_tags, MAX_TAGS};
pub use toc::{anchor, build_toc, insert_toc, TOC_HEADING};
pub use video::video_markdown;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::extractor::ExtractedContent;
use crate::models::SourceType;

/// Errors raised while rendering Markdown.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConversionError {
    #[error("conversion produced an empty document")]
    EmptyDocument,
}

/// A rendered document ready for the version store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownDocument {
    pub title: String,
    /// Full Markdown body including the title heading.
    pub markdown: String,
    /// Images referenced by the body, to be downloaded next to it.
    pub images: Vec<ImageRef>,
    /// Link to the video for video sources.
    pub video_url: Option<String>,
    pub summary: Option<String>,
    pub tags: Vec<String>,
}

/// Render `extracted` for a source of `source_type`.
pub fn convert(
    extracted: &ExtractedContent,
    source_type: SourceType,
) -> Result<MarkdownDocument, ConversionError> {
    let title = extracted.title.trim().to_string();

    let (markdown, images, video_url) = match source_type {
        SourceType::Video => (
            video_markdown(extracted),
            Vec::new(),
            Some(extracted.page_url.clone()),
        ),
        SourceType::Webpage => {
            let (html, images) = rewrite_images(&extracted.html, &extracted.page_url);
            let body = html_to_markdown(&html);
            if body.trim().is_empty() {
                return Err(ConversionError::EmptyDocument);
            }
            let titled = if body.starts_with("# ") {
                body
            } else {
                format!("# {}\n\n{}", title, body)
            };
            (insert_toc(&titled), images, None)
        }
    };

    let summary = summarize(&markdown);
    let tags = extract_tags(&markdown, &title);

    Ok(MarkdownDocument {
        title,
        markdown: format!("{}\n", markdown.trim_end()),
        images,
        video_url,
        summary,
        tags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::PageMetadata;

    fn extracted(html: &str) -> ExtractedContent {
        ExtractedContent {
            title: "Field Notes".into(),
            html: html.into(),
            text_length: html.len(),
            page_url: "https://example.com/notes/field".into(),
            metadata: PageMetadata::default(),
            matched_by: Some("article".into()),
        }
    }

    #[test]
    fn test_title_prepended_when_missing() {
        let doc = convert(
            &extracted("<article><p>Some observations from the field today.</p></article>"),
            SourceType::Webpage,
        )
        .unwrap();
        assert!(doc.markdown.starts_with("# Field Notes\n\n"));
        assert!(doc.markdown.ends_with('\n'));
        assert!(!doc.markdown.ends_with("\n\n"));
    }

    #[test]
    fn test_images_rewritten() {
        let doc = convert(
            &extracted(r#"<p>Look at this picture of the site.</p><img src="/img/site.png" alt="site">"#),
            SourceType::Webpage,
        )
        .unwrap();
        assert_eq!(doc.images.len(), 1);
        assert_eq!(doc.images[0].url, "https://example.com/img/site.png");
        assert!(doc.markdown.contains(&doc.images[0].markdown_path()));
        assert!(!doc.markdown.contains("https://example.com/img/site.png"));
    }

    #[test]
    fn test_empty_document() {
        let err = convert(&extracted("<div>   </div>"), SourceType::Webpage).unwrap_err();
        assert_eq!(err, ConversionError::EmptyDocument);
    }

    #[test]
    fn test_deterministic() {
        let input = extracted(
            r#"<article><h2>Setup</h2><p>Install the tool.</p><h2>Usage</h2><ul><li>run</li><li>stop</li></ul><img src="a.png"></article>"#,
        );
        let a = convert(&input, SourceType::Webpage).unwrap();
        let b = convert(&input, SourceType::Webpage).unwrap();
        assert_eq!(a.markdown, b.markdown);
        assert_eq!(a.tags, b.tags);
        assert!(a.markdown.contains(TOC_HEADING));
    }

    #[test]
    fn test_video_has_no_images() {
        let mut input = extracted("");
        input.page_url = "https://youtu.be/abc123".into();
        let doc = convert(&input, SourceType::Video).unwrap();
        assert_eq!(doc.video_url.as_deref(), Some("https://youtu.be/abc123"));
        assert!(doc.images.is_empty());
        assert!(doc.markdown.contains("https://youtu.be/abc123"));
    }
}
