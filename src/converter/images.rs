//! Image reference rewriting.
//!
//! Every `<img>` in the content is pointed at `images/<filename>` where the
//! filename is derived from its position and a hash of its absolute URL, so
//! the same input always yields the same references.

use scraper::Html;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

use crate::utils::{image_extension, serialize_children, ElementAction};

/// Directory (relative to the Markdown file) holding downloaded images.
pub const IMAGES_DIR: &str = "images";

/// Attributes consulted for the image location, lazy-load variants last.
const SRC_ATTRS: &[&str] = &["src", "data-src", "data-original"];

/// A remote image and the local name it is referenced by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Absolute URL to download from.
    pub url: String,
    /// File name under [`IMAGES_DIR`].
    pub filename: String,
}

impl ImageRef {
    /// Reference used inside the Markdown body.
    pub fn markdown_path(&self) -> String {
        format!("{}/{}", IMAGES_DIR, self.filename)
    }
}

/// Rewrite image sources in `html`, returning the new HTML and the images
/// to download in document order.
///
/// `data:` URIs and images without a source are removed. Sources that cannot
/// be resolved to an absolute URL keep their normalized relative path and are
/// not downloaded.
pub fn rewrite_images(html: &str, page_url: &str) -> (String, Vec<ImageRef>) {
    let base = Url::parse(page_url).ok();
    let fragment = Html::parse_fragment(html);
    let mut images: Vec<ImageRef> = Vec::new();

    let rewritten = serialize_children(fragment.root_element(), None, |el| {
        if el.value().name() != "img" {
            return ElementAction::Keep;
        }
        let Some(src) = SRC_ATTRS
            .iter()
            .filter_map(|attr| el.value().attr(attr))
            .map(str::trim)
            .find(|s| !s.is_empty())
        else {
            return ElementAction::Drop;
        };
        if src.starts_with("data:") {
            return ElementAction::Drop;
        }

        let local = match resolve(base.as_ref(), src) {
            Some(absolute) => {
                // Repeated images share one download.
                match images.iter().find(|img| img.url == absolute) {
                    Some(existing) => existing.markdown_path(),
                    None => {
                        let image = ImageRef {
                            filename: image_filename(images.len(), &absolute),
                            url: absolute,
                        };
                        let path = image.markdown_path();
                        images.push(image);
                        path
                    }
                }
            }
            None => normalize_relative(src),
        };

        let mut attrs = vec![("src".to_string(), local)];
        for key in ["alt", "title"] {
            if let Some(value) = el.value().attr(key) {
                attrs.push((key.to_string(), value.to_string()));
            }
        }
        ElementAction::Attrs(attrs)
    });

    (rewritten, images)
}

/// `img_<index>_<hash8><ext>` for the image at `index`.
pub fn image_filename(index: usize, url: &str) -> String {
    let digest = hex::encode(Sha256::digest(url.as_bytes()));
    format!("img_{}_{}{}", index, &digest[..8], image_extension(url))
}

/// Strip a leading `./` or `/` from a relative path.
pub fn normalize_relative(path: &str) -> String {
    let mut p = path.trim();
    loop {
        if let Some(rest) = p.strip_prefix("./") {
            p = rest;
        } else if let Some(rest) = p.strip_prefix('/') {
            p = rest;
        } else {
            break;
        }
    }
    p.to_string()
}

fn resolve(base: Option<&Url>, src: &str) -> Option<String> {
    if let Ok(url) = Url::parse(src) {
        return matches!(url.scheme(), "http" | "https").then(|| url.to_string());
    }
    let joined = base?.join(src).ok()?;
    matches!(joined.scheme(), "http" | "https").then(|| joined.to_string())
}
