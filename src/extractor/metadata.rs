//! Title and page metadata discovery.

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

use super::clean::collapse_whitespace;

/// Title used when no strategy yields one.
pub const UNTITLED: &str = "Untitled";

/// Descriptive metadata read from `<meta>` tags and common markup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub description: Option<String>,
    pub author: Option<String>,
    pub published: Option<String>,
    pub image: Option<String>,
}

impl PageMetadata {
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.author.is_none()
            && self.published.is_none()
            && self.image.is_none()
    }
}

/// Resolve the page title.
///
/// Strategies in order: configured selector, first `h1`, `og:title`,
/// `<title>`, the last URL path segment, then [`UNTITLED`].
pub fn extract_title(document: &Html, title_selector: Option<&Selector>, page_url: &str) -> String {
    if let Some(selector) = title_selector {
        if let Some(title) = first_text(document, selector) {
            return title;
        }
    }

    if let Some(title) = parse("h1").and_then(|s| first_text(document, &s)) {
        return title;
    }

    if let Some(title) = meta_content(document, &["meta[property=\"og:title\"]"]) {
        return title;
    }

    if let Some(title) = parse("title").and_then(|s| first_text(document, &s)) {
        return title;
    }

    title_from_url(page_url).unwrap_or_else(|| UNTITLED.to_string())
}

/// Derive a title from the last path segment: `my-first_post` → `My First Post`.
pub fn title_from_url(page_url: &str) -> Option<String> {
    let url = Url::parse(page_url).ok()?;
    let segment = url
        .path_segments()?
        .rev()
        .find(|s| !s.is_empty())?
        .to_string();
    let stem = segment
        .rsplit_once('.')
        .map(|(stem, _)| stem.to_string())
        .unwrap_or(segment);

    let words: Vec<String> = stem
        .split(['-', '_', ' '])
        .filter(|w| !w.is_empty())
        .map(capitalize)
        .collect();
    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Read description, author, publish date and lead image.
pub fn extract_metadata(document: &Html) -> PageMetadata {
    let author = meta_content(document, &["meta[name=\"author\"]", "meta[property=\"article:author\"]"])
        .or_else(|| {
            parse(".author, [rel=\"author\"]").and_then(|s| first_text(document, &s))
        });

    let published = meta_content(
        document,
        &[
            "meta[property=\"article:published_time\"]",
            "meta[name=\"date\"]",
            "meta[name=\"pubdate\"]",
        ],
    )
    .or_else(|| {
        parse("time[datetime]").and_then(|s| {
            document
                .select(&s)
                .next()
                .and_then(|el| el.value().attr("datetime"))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        })
    });

    PageMetadata {
        description: meta_content(
            document,
            &["meta[name=\"description\"]", "meta[property=\"og:description\"]"],
        ),
        author,
        published,
        image: meta_content(document, &["meta[property=\"og:image\"]"]),
    }
}

fn parse(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .find(|t| !t.is_empty())
}

fn meta_content(document: &Html, selectors: &[&str]) -> Option<String> {
    selectors.iter().find_map(|css| {
        let selector = parse(css)?;
        document
            .select(&selector)
            .filter_map(|el| el.value().attr("content"))
            .map(str::trim)
            .find(|v| !v.is_empty())
            .map(str::to_string)
    })
}
