//! Filesystem-backed media storage.
//!
//! Stands in for the hosted blob service: `upload` persists the bytes and
//! returns the URL under which the media can be retrieved.  File names are
//! freshly generated UUIDs plus a sanitized extension, and every path is
//! validated against traversal out of the base directory.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Result, StoreError};

/// Verify that a stored file name cannot escape the media directory.
fn ensure_plain_name(name: &str) -> Result<()> {
    if name.is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name.contains("..")
    {
        return Err(StoreError::MediaStorage(format!(
            "invalid media name '{name}'"
        )));
    }
    Ok(())
}

/// Keep only a short, alphanumeric, lowercased extension.
fn sanitize_extension(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name).extension()?.to_str()?;
    if ext.is_empty() || ext.len() > 8 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// A successfully stored media object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMedia {
    /// File name under the media directory (`<uuid>.<ext>`).
    pub file_name: String,
    /// URL the application serves the media under.
    pub url: String,
    pub size: usize,
}

#[derive(Debug, Clone)]
pub struct MediaStore {
    base_path: PathBuf,
    max_size: usize,
}

impl MediaStore {
    pub async fn new(base_path: PathBuf, max_size: usize) -> Result<Self> {
        fs::create_dir_all(&base_path).await.map_err(|e| {
            StoreError::MediaStorage(format!(
                "failed to create media directory '{}': {}",
                base_path.display(),
                e
            ))
        })?;

        info!(path = %base_path.display(), "media store initialized");

        Ok(Self {
            base_path,
            max_size,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Persist an upload and return its retrieval URL.  The original file
    /// name only contributes its extension.
    pub async fn upload(&self, original_name: &str, data: &[u8]) -> Result<StoredMedia> {
        if data.is_empty() {
            return Err(StoreError::MediaStorage("empty upload".to_string()));
        }
        if data.len() > self.max_size {
            return Err(StoreError::MediaTooLarge {
                size: data.len(),
                max: self.max_size,
            });
        }

        let file_name = match sanitize_extension(original_name) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };
        let path = self.base_path.join(&file_name);

        fs::write(&path, data).await.map_err(|e| {
            StoreError::MediaStorage(format!("failed to write media '{file_name}': {e}"))
        })?;

        debug!(file = %file_name, size = data.len(), "stored media");
        Ok(StoredMedia {
            url: format!("/media/{file_name}"),
            file_name,
            size: data.len(),
        })
    }

    /// Read a stored media file back by its stored name.
    pub async fn read(&self, file_name: &str) -> Result<Vec<u8>> {
        ensure_plain_name(file_name)?;
        let path = self.base_path.join(file_name);

        if !path.exists() {
            return Err(StoreError::MediaNotFound(file_name.to_string()));
        }

        fs::read(&path).await.map_err(|e| {
            StoreError::MediaStorage(format!("failed to read media '{file_name}': {e}"))
        })
    }

    /// Delete a stored media file.
    pub async fn delete(&self, file_name: &str) -> Result<()> {
        ensure_plain_name(file_name)?;
        let path = self.base_path.join(file_name);

        if !path.exists() {
            return Err(StoreError::MediaNotFound(file_name.to_string()));
        }

        fs::remove_file(&path).await.map_err(|e| {
            StoreError::MediaStorage(format!("failed to delete media '{file_name}': {e}"))
        })?;

        debug!(file = %file_name, "deleted media");
        Ok(())
    }
}
