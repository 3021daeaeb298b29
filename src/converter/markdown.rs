//! HTML to Markdown rendering and canonical cleanup.

/// Render cleaned HTML as canonical Markdown.
pub fn html_to_markdown(html: &str) -> String {
    normalize(&html2md::parse_html(html))
}

/// Canonical layout: ATX headings, no trailing spaces, at most one blank
/// line in a row, no leading or trailing blank lines.
pub fn normalize(markdown: &str) -> String {
    let atx = setext_to_atx(markdown);
    let mut out: Vec<&str> = Vec::new();
    let mut in_fence = false;

    for line in atx.lines() {
        let line = line.trim_end();
        if is_fence(line) {
            in_fence = !in_fence;
        }
        if line.is_empty() && !in_fence {
            if out.last().map_or(true, |l| l.is_empty()) {
                continue;
            }
        }
        out.push(line);
    }

    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    out.join("\n")
}

/// Rewrite `Title\n=====` / `Title\n-----` headings as `#` / `##`.
///
/// A `=====` line with no heading text above it, as left by an empty `<h1>`,
/// is dropped.
fn setext_to_atx(markdown: &str) -> String {
    let lines: Vec<&str> = markdown.lines().collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut in_fence = false;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        if is_fence(line) {
            in_fence = !in_fence;
        }
        if !in_fence && i + 1 < lines.len() && is_heading_text(line) {
            let level = underline_level(lines[i + 1]);
            if let Some(level) = level {
                out.push(format!("{} {}", "#".repeat(level), line.trim()));
                i += 2;
                continue;
            }
        }
        if !in_fence && underline_level(line) == Some(1) {
            i += 1;
            continue;
        }
        out.push(line.to_string());
        i += 1;
    }
    out.join("\n")
}

fn is_heading_text(line: &str) -> bool {
    let t = line.trim();
    !t.is_empty()
        && !t.starts_with('#')
        && !t.starts_with('>')
        && !t.starts_with('|')
        && !t.starts_with("- ")
        && !t.starts_with("* ")
        && underline_level(t).is_none()
}

fn underline_level(line: &str) -> Option<usize> {
    let t = line.trim();
    if t.len() < 2 {
        return None;
    }
    if t.chars().all(|c| c == '=') {
        Some(1)
    } else if t.chars().all(|c| c == '-') {
        Some(2)
    } else {
        None
    }
}

pub(crate) fn is_fence(line: &str) -> bool {
    let t = line.trim_start();
    t.starts_with("```") || t.starts_with("~~~")
}

/// Parse an ATX heading into `(level, text)`.
pub(crate) fn heading(line: &str) -> Option<(usize, &str)> {
    let hashes = line.chars().take_while(|c| *c == '#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    let rest = &line[hashes..];
    if !rest.starts_with(' ') {
        return None;
    }
    let text = rest.trim().trim_end_matches('#').trim();
    (!text.is_empty()).then_some((hashes, text))
}
