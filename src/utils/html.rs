//! HTML escaping and filtered re-serialization of parsed fragments.

use scraper::{ElementRef, Selector};

/// Elements that never have a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Escape HTML special characters for safe rendering.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// What to do with an element while serializing.
pub enum ElementAction {
    /// Emit the element unchanged.
    Keep,
    /// Omit the element and its whole subtree.
    Drop,
    /// Emit the element with these attributes instead of its own.
    Attrs(Vec<(String, String)>),
}

/// Serialize `root` (including itself) back to HTML.
///
/// Elements matching `skip` are removed with their subtree; every other
/// element is passed to `visit`, which may drop it or replace its attributes.
pub fn serialize_filtered<F>(root: ElementRef<'_>, skip: Option<&Selector>, mut visit: F) -> String
where
    F: FnMut(ElementRef<'_>) -> ElementAction,
{
    let mut out = String::new();
    write_element(root, skip, &mut visit, &mut out);
    out
}

/// Serialize the children of `root` without its own tag.
pub fn serialize_children<F>(root: ElementRef<'_>, skip: Option<&Selector>, mut visit: F) -> String
where
    F: FnMut(ElementRef<'_>) -> ElementAction,
{
    let mut out = String::new();
    write_children(root, skip, &mut visit, &mut out);
    out
}

/// Visible text of `root`, skipping subtrees matching `skip`.
pub fn visible_text(root: ElementRef<'_>, skip: Option<&Selector>) -> String {
    let mut out = String::new();
    collect_text(root, skip, &mut out);
    out
}

fn collect_text(element: ElementRef<'_>, skip: Option<&Selector>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(el) = ElementRef::wrap(child) {
            if skip.is_some_and(|s| s.matches(&el)) {
                continue;
            }
            collect_text(el, skip, out);
        }
    }
}

fn write_children<F>(element: ElementRef<'_>, skip: Option<&Selector>, visit: &mut F, out: &mut String)
where
    F: FnMut(ElementRef<'_>) -> ElementAction,
{
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(&html_escape(text));
        } else if let Some(el) = ElementRef::wrap(child) {
            write_element(el, skip, visit, out);
        }
    }
}

fn write_element<F>(element: ElementRef<'_>, skip: Option<&Selector>, visit: &mut F, out: &mut String)
where
    F: FnMut(ElementRef<'_>) -> ElementAction,
{
    if skip.is_some_and(|s| s.matches(&element)) {
        return;
    }
    let attrs: Vec<(String, String)> = match visit(element) {
        ElementAction::Drop => return,
        ElementAction::Keep => element
            .value()
            .attrs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        ElementAction::Attrs(attrs) => attrs,
    };

    let name = element.value().name();
    out.push('<');
    out.push_str(name);
    for (key, value) in &attrs {
        out.push(' ');
        out.push_str(key);
        out.push_str("=\"");
        out.push_str(&html_escape(value));
        out.push('"');
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&name) {
        return;
    }

    write_children(element, skip, visit, out);

    out.push_str("</");
    out.push_str(name);
    out.push('>');
}
