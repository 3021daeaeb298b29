//! Table of contents generation.

use super::markdown::{heading, is_fence};

/// Heading shown above the generated table of contents.
pub const TOC_HEADING: &str = "## Contents";

const MIN_LEVEL: usize = 2;
const MAX_LEVEL: usize = 4;
const MIN_ENTRIES: usize = 2;

/// Build the table of contents for `markdown`, if it has enough headings.
pub fn build_toc(markdown: &str) -> Option<String> {
    let mut entries = Vec::new();
    let mut in_fence = false;
    for line in markdown.lines() {
        if is_fence(line) {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        if let Some((level, text)) = heading(line) {
            if (MIN_LEVEL..=MAX_LEVEL).contains(&level) {
                entries.push(format!(
                    "{}- [{}](#{})",
                    "  ".repeat(level - MIN_LEVEL),
                    text,
                    anchor(text)
                ));
            }
        }
    }

    if entries.len() < MIN_ENTRIES {
        return None;
    }
    Some(format!("{}\n\n{}", TOC_HEADING, entries.join("\n")))
}

/// Insert the table of contents after the leading `# title` line.
pub fn insert_toc(markdown: &str) -> String {
    let Some(toc) = build_toc(markdown) else {
        return markdown.to_string();
    };
    match markdown.split_once('\n') {
        Some((first, rest)) if heading(first).is_some_and(|(level, _)| level == 1) => {
            format!("{}\n\n{}\n\n{}", first, toc, rest.trim_start_matches('\n'))
        }
        _ => format!("{}\n\n{}", toc, markdown),
    }
}

/// GitHub-style anchor: lower-cased, spaces to hyphens, punctuation dropped.
pub fn anchor(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.to_lowercase().chars() {
        if c.is_whitespace() || c == '-' {
            if !out.ends_with('-') {
                out.push('-');
            }
        } else if c.is_alphanumeric() || c == '_' {
            out.push(c);
        }
    }
    out.trim_matches('-').to_string()
}
