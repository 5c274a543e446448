//! Media storage collaborator: bytes in, stable public URLs out.
//!
//! The catalog treats the object store and the CDN image service as opaque
//! string producers. This local-disk implementation keeps the same contract
//! so the rest of the system never learns where bytes actually live.

use crate::error::AppError;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Writes uploaded bytes under a local media directory and hands back the
/// public URL they will be served from.
pub struct MediaStore {
    root: PathBuf,
    base_url: String,
}

impl MediaStore {
    /// Create a store rooted at `root`, serving from `base_url`.
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Persist `bytes` under `folder` and return the stable public URL.
    ///
    /// File names are prefixed with a fresh uuid so repeated uploads of the
    /// same logical name never collide or overwrite.
    ///
    /// # Arguments
    /// - `folder`: Logical folder, e.g. a family slug.
    /// - `filename`: Client-supplied name; only its sanitized form is used.
    /// - `bytes`: Raw file content.
    ///
    /// # Returns
    /// The public URL of the stored object.
    ///
    /// # Errors
    /// Returns [`AppError::Storage`] when the directory or file cannot be
    /// written.
    pub fn store(&self, folder: &str, filename: &str, bytes: &[u8]) -> Result<String, AppError> {
        let safe_name = sanitize_filename(filename);
        let object_name = format!("{}-{}", Uuid::new_v4(), safe_name);
        let dir = self.root.join(folder);
        std::fs::create_dir_all(&dir).map_err(|err| {
            AppError::Storage(format!("Cannot create '{}': {}", dir.display(), err))
        })?;
        let path = dir.join(&object_name);
        std::fs::write(&path, bytes).map_err(|err| {
            AppError::Storage(format!("Cannot write '{}': {}", path.display(), err))
        })?;
        Ok(format!("{}/{}/{}", self.base_url, folder, object_name))
    }

    /// Root directory backing this store.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Derive a parameterized thumbnail URL from an existing image URL.
///
/// Mirrors CDN-style transformations: the original URL plus width, height,
/// and quality parameters. Purely string-level; the caller never needs to
/// know whether a real transformation service sits behind it.
pub fn thumbnail_url(url: &str, width: u32, height: u32, quality: u8) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}w={}&h={}&q={}", url, separator, width, height, quality)
}

fn sanitize_filename(filename: &str) -> String {
    let cleaned: String = filename
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    // Collapse anything that was pure separators into a usable name.
    if cleaned.trim_matches(|c| c == '-' || c == '.').is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}
