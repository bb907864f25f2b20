//! Uploaded product images, written under the media root and served back
//! at [`MEDIA_URL`].

use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

/// URL prefix the media root is served under.
pub const MEDIA_URL: &str = "/media";

/// Largest request body accepted on product routes.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

const PRODUCT_IMAGE_DIR: &str = "products";

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("The submitted file is empty.")]
    Empty,

    #[error(
        "Upload a valid image. The file you uploaded was either not an image or a corrupted image."
    )]
    NotAnImage,

    #[error("failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

/// A file received in a multipart body.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Filesystem storage for uploaded images.
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes a product image under a fresh name and returns its path
    /// relative to the media root. The extension follows the file's
    /// contents, not the client's file name.
    pub async fn save_product_image(&self, upload: &Upload) -> Result<String, MediaError> {
        if upload.bytes.is_empty() {
            return Err(MediaError::Empty);
        }
        let extension = sniff_image(&upload.bytes).ok_or(MediaError::NotAnImage)?;

        let dir = self.root.join(PRODUCT_IMAGE_DIR);
        tokio::fs::create_dir_all(&dir).await?;

        let name = format!("{}.{extension}", Uuid::new_v4().simple());
        tokio::fs::write(dir.join(&name), &upload.bytes).await?;

        tracing::info!(
            file = %name,
            original = %upload.file_name,
            size = upload.bytes.len(),
            "stored product image"
        );
        Ok(format!("{PRODUCT_IMAGE_DIR}/{name}"))
    }

    /// Deletes a stored file. Failures are logged, not returned.
    pub async fn remove(&self, path: &str) {
        if let Err(err) = tokio::fs::remove_file(self.root.join(path)).await {
            tracing::warn!(error = %err, path, "failed to remove stored media");
        }
    }
}

/// Public URL of a path relative to the media root.
pub fn media_url(path: &str) -> String {
    format!("{MEDIA_URL}/{path}")
}

/// Recognizes the image formats browsers render, by magic number.
fn sniff_image(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("jpg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("gif")
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("webp")
    } else {
        None
    }
}
