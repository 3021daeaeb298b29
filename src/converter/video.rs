//! Minimal Markdown for video pages.
//!
//! Video sources are never downloaded or embedded; the document records the
//! link and whatever metadata the page exposed.

use crate::extractor::ExtractedContent;

/// Render the Markdown body for a video page.
pub fn video_markdown(extracted: &ExtractedContent) -> String {
    let meta = &extracted.metadata;
    let mut lines = vec![
        format!("# {}", extracted.title.trim()),
        String::new(),
        format!("- Video URL: {}", extracted.page_url),
    ];
    if let Some(author) = &meta.author {
        lines.push(format!("- Author: {}", author));
    }
    if let Some(published) = &meta.published {
        lines.push(format!("- Published: {}", published));
    }
    if let Some(image) = &meta.image {
        lines.push(format!("- Thumbnail: {}", image));
    }
    if let Some(description) = meta.description.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        lines.push(String::new());
        lines.push(description.to_string());
    }
    lines.join("\n")
}
