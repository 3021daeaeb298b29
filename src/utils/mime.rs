//! Image type detection for archived assets.

/// Extensions kept as-is when they appear on an image URL.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "svg", "bmp", "ico", "avif"];

/// File extension (with leading dot) for an image URL.
///
/// Unknown or missing extensions fall back to `.jpg`.
pub fn image_extension(url: &str) -> String {
    let path = url::Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.split(['?', '#']).next().unwrap_or_default().to_string());

    let ext = path
        .rsplit('/')
        .next()
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase());

    match ext {
        Some(ext) if IMAGE_EXTENSIONS.contains(&ext.as_str()) => format!(".{}", ext),
        _ => ".jpg".to_string(),
    }
}
