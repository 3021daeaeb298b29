//! Search URL construction and result-link harvesting.

use std::collections::{BTreeMap, HashSet};

use scraper::{Html, Selector};
use url::Url;

use super::FetchError;

/// Containers waited for when no `search_wait_selector` is configured.
pub const SEARCH_FALLBACK_SELECTORS: &[&str] = &[
    ".search-list-con",
    ".search-list",
    ".search-result",
    "[class*=\"search\"]",
    "article",
    ".result-item",
];

const DEFAULT_LINK_SELECTOR: &str = "a[href]";

const VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".avi", ".mov", ".flv", ".webm"];

/// Merge `params` into the query string of `pattern`.
///
/// Existing keys are replaced in place; new keys are appended in key order.
pub fn build_search_url(
    pattern: &str,
    params: &BTreeMap<String, String>,
) -> Result<String, FetchError> {
    let mut url = Url::parse(pattern).map_err(|e| FetchError::InvalidUrl(format!("{pattern}: {e}")))?;
    if params.is_empty() {
        return Ok(url.to_string());
    }

    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    for (key, value) in params {
        match pairs.iter_mut().find(|(k, _)| k == key) {
            Some(pair) => pair.1 = value.clone(),
            None => pairs.push((key.clone(), value.clone())),
        }
    }

    url.query_pairs_mut().clear().extend_pairs(pairs.iter());
    Ok(url.to_string())
}

/// Collect result links from a rendered search page.
pub fn extract_result_links(
    html: &str,
    page_url: &str,
    link_selector: Option<&str>,
    max_links: usize,
    video_only: bool,
) -> Vec<String> {
    let Ok(base) = Url::parse(page_url) else {
        return Vec::new();
    };
    let selector_str = link_selector
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_LINK_SELECTOR);
    let Ok(selector) = Selector::parse(selector_str) else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&selector) {
        if links.len() >= max_links {
            break;
        }
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
            continue;
        }
        let Ok(mut resolved) = base.join(href) else {
            continue;
        };
        if !matches!(resolved.scheme(), "http" | "https") {
            continue;
        }
        resolved.set_fragment(None);

        if is_search_page(&resolved, &base) {
            continue;
        }
        if video_only && !is_video_link(resolved.as_str()) {
            continue;
        }

        let link = resolved.to_string();
        if seen.insert(link.clone()) {
            links.push(link);
        }
    }

    links
}

/// Whether `url` points back at the search page itself.
fn is_search_page(url: &Url, search: &Url) -> bool {
    if url.as_str() == search.as_str() {
        return true;
    }
    if url.host_str() == search.host_str() && url.path() == search.path() {
        return true;
    }
    let path = url.path().trim_end_matches('/');
    path == "/search" || path == "/so/search"
}

/// Heuristic for links that lead to a video page or file.
pub fn is_video_link(url: &str) -> bool {
    let lower = url.to_lowercase();
    if lower.contains("bilibili.com/video/")
        || (lower.contains("youtube.com") && lower.contains("/watch"))
        || lower.contains("youtu.be/")
        || lower.contains("/video/")
        || lower.contains("/v/")
        || lower.contains("watch?v=")
    {
        return true;
    }
    let path = Url::parse(&lower)
        .map(|u| u.path().to_string())
        .unwrap_or(lower);
    VIDEO_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}
