//! Keyword tags derived from the title and body.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// Maximum number of tags kept per document.
pub const MAX_TAGS: usize = 10;

/// Maximum number of body keywords considered.
const MAX_KEYWORDS: usize = 8;

const STOP_WORDS: &[&str] = &[
    "this", "that", "the", "a", "an", "is", "are", "was", "were", "be", "been", "have", "has",
    "had", "do", "does", "did", "will", "would", "could", "should", "and", "or", "but", "if",
    "because", "so", "when", "where", "what", "how", "why", "with", "from", "to", "for", "of",
    "in", "on", "at", "by", "as", "about", "you", "your", "can", "not", "all", "its", "our",
    "they", "their", "there", "here", "also", "into", "more", "than", "then", "them", "which",
    "的", "了", "在", "是", "我", "有", "和", "就", "不", "一个", "可以", "这个", "那个",
    "我们", "你们", "他们", "什么", "怎么", "如何", "以及", "然后", "但是", "如果", "因为",
    "所以",
];

static WORD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z]{3,}|[\u{4e00}-\u{9fa5}]{2,4}").unwrap());

static LINK_TARGET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\]\([^)]*\)").unwrap());

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    WORD_PATTERN
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|w| !STOP_WORDS.contains(&w.as_str()))
}

/// Title words first, then body words seen at least twice, most frequent
/// first. Order is stable for identical input.
pub fn extract_tags(markdown: &str, title: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for word in words(title) {
        if !tags.contains(&word) {
            tags.push(word);
        }
    }

    let body = LINK_TARGET.replace_all(markdown, "]");
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (position, word) in words(&body).enumerate() {
        counts.entry(word).or_insert((0, position)).0 += 1;
    }
    let mut keywords: Vec<(String, usize, usize)> = counts
        .into_iter()
        .filter(|(_, (count, _))| *count >= 2)
        .map(|(word, (count, first))| (word, count, first))
        .collect();
    keywords.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    for (word, _, _) in keywords.into_iter().take(MAX_KEYWORDS) {
        if !tags.contains(&word) {
            tags.push(word);
        }
    }

    tags.truncate(MAX_TAGS);
    tags
}
