//! Short plain-text summaries of Markdown documents.

use std::sync::LazyLock;

use regex::Regex;

use super::markdown::{heading, is_fence};

/// Maximum summary length in characters.
pub const MAX_SUMMARY_CHARS: usize = 200;

/// Paragraphs shorter than this are merged with the following ones.
const SHORT_SUMMARY: usize = 50;

const MIN_PARAGRAPH: usize = 10;

static IMAGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)").unwrap());
static LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").unwrap());
static EMPHASIS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[*_`~]+").unwrap());
static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?:[-*+]|\d+\.)\s+").unwrap());

/// Summarize `markdown` from its first prose paragraphs.
///
/// Headings, list items, code blocks, tables and quotes are skipped. Returns
/// `None` when the document has no prose.
pub fn summarize(markdown: &str) -> Option<String> {
    let paragraphs = prose_lines(markdown);
    let first = paragraphs.first()?;

    let mut summary = first.clone();
    if summary.chars().count() < SHORT_SUMMARY {
        summary = paragraphs.iter().take(3).cloned().collect::<Vec<_>>().join(" ");
    }

    Some(truncate(&summary, MAX_SUMMARY_CHARS))
}

fn prose_lines(markdown: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut in_fence = false;
    for line in markdown.lines() {
        if is_fence(line) {
            in_fence = !in_fence;
            continue;
        }
        let line = line.trim();
        if in_fence
            || line.is_empty()
            || heading(line).is_some()
            || LIST_ITEM.is_match(line)
            || line.starts_with('|')
            || line.starts_with('>')
        {
            continue;
        }
        let text = plain_text(line);
        if text.chars().count() > MIN_PARAGRAPH {
            out.push(text);
        }
    }
    out
}

/// Strip inline Markdown syntax from a single line.
fn plain_text(line: &str) -> String {
    let no_images = IMAGE.replace_all(line, "");
    let no_links = LINK.replace_all(&no_images, "$1");
    let plain = EMPHASIS.replace_all(&no_links, "");
    plain.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cut to at most `max` characters, preferring a sentence boundary.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let head: String = text.chars().take(max - 3).collect();
    if let Some(pos) = head.rfind(['。', '.', '!', '?']) {
        let end = pos + head[pos..].chars().next().map_or(1, char::len_utf8);
        if head[..end].chars().count() >= max / 2 {
            return head[..end].to_string();
        }
    }
    format!("{}...", head.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_prose_paragraph() {
        let md = "# Title\n\n## Contents\n\n- [A](#a)\n\nThis is the opening paragraph of the article, long enough to stand alone as a summary.\n\nSecond.";
        assert_eq!(
            summarize(md).as_deref(),
            Some("This is the opening paragraph of the article, long enough to stand alone as a summary.")
        );
    }

    #[test]
    fn test_short_paragraphs_are_merged() {
        let md = "# T\n\nShort opening line.\n\nAnother short line here.\n\nAnd a [third](https://x.com) one.";
        assert_eq!(
            summarize(md).as_deref(),
            Some("Short opening line. Another short line here. And a third one.")
        );
    }

    #[test]
    fn test_truncated_to_limit() {
        let sentence = "Words keep flowing in this sentence. ";
        let md = sentence.repeat(20);
        let summary = summarize(&md).unwrap();
        assert!(summary.chars().count() <= MAX_SUMMARY_CHARS);
        assert!(summary.ends_with('.'));
    }

    #[test]
    fn test_no_prose() {
        assert!(summarize("# Title\n\n```\ncode only here\n```").is_none());
    }
}
