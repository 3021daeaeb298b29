//! Noise stripping for extracted content regions.

use std::sync::OnceLock;

use scraper::{ElementRef, Selector};

use crate::utils::{serialize_filtered, visible_text, ElementAction};

/// Regions removed from every content candidate before scoring and output.
pub const STRIP_SELECTORS: &[&str] = &[
    "script",
    "style",
    "noscript",
    "iframe",
    "header",
    "footer",
    "nav",
    "aside",
    ".nav",
    "#nav",
    ".sidebar",
    ".sidebar-menu",
    "#sidebar",
    ".comments",
    ".comment",
    "#comments",
    ".ad",
    ".ads",
    ".advertisement",
    ".share",
    ".social-share",
    ".breadcrumb",
    ".breadcrumbs",
];

/// Compiled union of [`STRIP_SELECTORS`].
pub fn strip_selector() -> Option<&'static Selector> {
    static SELECTOR: OnceLock<Option<Selector>> = OnceLock::new();
    SELECTOR
        .get_or_init(|| Selector::parse(&STRIP_SELECTORS.join(", ")).ok())
        .as_ref()
}

/// Cleaned HTML of `element` with all noise regions removed.
pub fn clean_html(element: ElementRef<'_>) -> String {
    serialize_filtered(element, strip_selector(), |_| ElementAction::Keep)
}

/// Visible text of `element` after stripping, with whitespace collapsed.
pub fn clean_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&visible_text(element, strip_selector()))
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
