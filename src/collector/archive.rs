//! Markdown archive on disk.
//!
//! Layout: `<root>/<source>/<YYYY-MM-DD>/<title>.md` with images in an
//! `images/` directory next to the Markdown files of the same day.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::converter::IMAGES_DIR;

const MAX_FILENAME_CHARS: usize = 100;

/// Filesystem archive rooted at the collections directory.
#[derive(Debug, Clone)]
pub struct Archive {
    root: PathBuf,
}

impl Archive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of a document relative to the archive root.
    pub fn relative_path(&self, source_name: &str, title: &str, date: NaiveDate) -> PathBuf {
        PathBuf::from(sanitize_filename(source_name))
            .join(date.format("%Y-%m-%d").to_string())
            .join(format!("{}.md", sanitize_filename(title)))
    }

    /// Absolute path for a path returned by [`Archive::relative_path`].
    pub fn resolve(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    /// Write the Markdown body, creating parent directories.
    pub async fn write_markdown(&self, relative: &Path, markdown: &str) -> std::io::Result<PathBuf> {
        let path = self.resolve(relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, markdown).await?;
        Ok(path)
    }

    /// Write an image next to the document at `relative`.
    ///
    /// Existing files are kept; image names embed a hash of their URL.
    pub async fn write_image(
        &self,
        relative: &Path,
        filename: &str,
        bytes: &[u8],
    ) -> std::io::Result<PathBuf> {
        let dir = self
            .resolve(relative)
            .parent()
            .map(|p| p.join(IMAGES_DIR))
            .unwrap_or_else(|| self.root.join(IMAGES_DIR));
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(sanitize_filename(filename));
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tokio::fs::write(&path, bytes).await?;
        }
        Ok(path)
    }
}

/// Make `name` safe as a single path component.
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = sanitized.trim().trim_matches('_').trim_matches('.');
    if trimmed.is_empty() {
        return "document".to_string();
    }
    trimmed.chars().take(MAX_FILENAME_CHARS).collect::<String>().trim_end().to_string()
}
