//! Product image storage on the local filesystem.
//!
//! Uploaded files are renamed to `<uuid>.<ext>` and served back under
//! `/images/`. The stored product `image` field is that file name.

use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

use crate::config::ImageConfig;

/// Errors from image storage.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("image is empty")]
    Empty,

    #[error("image too large ({size} bytes, max {max})")]
    TooLarge { size: usize, max: usize },

    #[error("unsupported image type (expected PNG, JPEG or WebP)")]
    UnsupportedType,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Accepted image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
    WebP,
}

impl ImageKind {
    /// Detect the format from the file's leading bytes.
    #[must_use]
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(Self::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(b"RIFF") && bytes.get(8..12) == Some(b"WEBP".as_slice()) {
            Some(Self::WebP)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }
}

/// Filesystem-backed image store.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
    max_bytes: usize,
}

impl ImageStore {
    #[must_use]
    pub fn new(config: &ImageConfig) -> Self {
        Self {
            dir: config.dir.clone(),
            max_bytes: config.max_bytes,
        }
    }

    /// Directory images are served from.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Check size and format without writing anything.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the upload is empty, too large or not an
    /// accepted image type.
    pub fn validate(&self, bytes: &[u8]) -> Result<ImageKind, StorageError> {
        if bytes.is_empty() {
            return Err(StorageError::Empty);
        }
        if bytes.len() > self.max_bytes {
            return Err(StorageError::TooLarge {
                size: bytes.len(),
                max: self.max_bytes,
            });
        }
        ImageKind::sniff(bytes).ok_or(StorageError::UnsupportedType)
    }

    /// Validate and write an upload. Returns the stored file name.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if validation or the write fails.
    pub async fn save(&self, bytes: &[u8]) -> Result<String, StorageError> {
        let kind = self.validate(bytes)?;
        let name = format!("{}.{}", Uuid::new_v4(), kind.extension());

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&name), bytes).await?;

        tracing::info!(image = %name, size = bytes.len(), "Product image stored");
        Ok(name)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    fn store(dir: PathBuf, max_bytes: usize) -> ImageStore {
        ImageStore::new(&ImageConfig { dir, max_bytes })
    }

    #[test]
    fn test_sniff_formats() {
        assert_eq!(ImageKind::sniff(PNG_HEADER), Some(ImageKind::Png));
        assert_eq!(ImageKind::sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::sniff(b"RIFF\0\0\0\0WEBPVP8 "), Some(ImageKind::WebP));
        assert_eq!(ImageKind::sniff(b"GIF89a"), None);
        assert_eq!(ImageKind::sniff(b"RIFF\0\0\0\0WAVE"), None);
    }

    #[test]
    fn test_validate_limits() {
        let store = store(PathBuf::from("unused"), 8);

        assert!(matches!(store.validate(&[]), Err(StorageError::Empty)));
        assert!(matches!(
            store.validate(PNG_HEADER),
            Err(StorageError::TooLarge { max: 8, .. })
        ));
        assert!(matches!(
            store.validate(b"hello"),
            Err(StorageError::UnsupportedType)
        ));
    }

    #[tokio::test]
    async fn test_save_writes_named_file() {
        let dir = std::env::temp_dir().join(format!("food-order-images-{}", Uuid::new_v4()));
        let store = store(dir.clone(), 1024);

        let name = store.save(PNG_HEADER).await.unwrap();

        assert!(name.ends_with(".png"));
        let written = tokio::fs::read(dir.join(&name)).await.unwrap();
        assert_eq!(written, PNG_HEADER);

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
