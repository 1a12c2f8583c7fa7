use std::path::{Path, PathBuf};

use axum::async_trait;
use bytes::Bytes;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::debug;

/// Sentinel reference stored on deals created without an image.
pub const NO_IMAGE_REF: &str = "/uploads/default.png";

/// Public path prefix under which stored blobs are served.
pub const PUBLIC_PREFIX: &str = "/uploads";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Only JPEG, JPG, and PNG formats are allowed")]
    UnsupportedMediaType,
    #[error("Image exceeds the {limit_bytes} byte limit")]
    TooLarge { limit_bytes: u64 },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// An in-memory upload as received from the multipart layer.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub content_type: String,
    pub body: Bytes,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Screens the upload (extension, declared MIME, size), writes it under a
    /// generated name and returns the public reference path. The write
    /// completes before the reference is handed back, so a stored reference
    /// always points at a durable blob.
    async fn accept(&self, upload: Upload) -> Result<String, StoreError>;
}

/// Filesystem-backed blob store rooted at a configured directory.
pub struct FsStore {
    root: PathBuf,
    max_bytes: u64,
}

impl FsStore {
    pub async fn new(root: PathBuf, max_bytes: u64) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root, max_bytes })
    }
}

/// Extension allow-list. Returns the canonical lowercase extension so the
/// stored name never contains attacker-controlled bytes.
fn allowed_ext(filename: &str) -> Option<&'static str> {
    let ext = Path::new(filename)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    match ext.as_str() {
        "jpeg" => Some("jpeg"),
        "jpg" => Some("jpg"),
        "png" => Some("png"),
        _ => None,
    }
}

fn allowed_mime(content_type: &str) -> bool {
    matches!(content_type, "image/jpeg" | "image/jpg" | "image/png")
}

/// Upload-time millis plus a random component; unique under concurrent
/// uploads and independent of the original filename.
fn generate_name(ext: &str) -> String {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let nonce: u64 = rand::random();
    format!("{millis}-{nonce:016x}.{ext}")
}

#[async_trait]
impl BlobStore for FsStore {
    async fn accept(&self, upload: Upload) -> Result<String, StoreError> {
        // Both the extension and the declared MIME must be allowed; a
        // mismatched pair is rejected.
        let ext = allowed_ext(&upload.filename).ok_or(StoreError::UnsupportedMediaType)?;
        if !allowed_mime(&upload.content_type) {
            return Err(StoreError::UnsupportedMediaType);
        }
        if upload.body.len() as u64 > self.max_bytes {
            return Err(StoreError::TooLarge {
                limit_bytes: self.max_bytes,
            });
        }

        let name = generate_name(ext);
        tokio::fs::write(self.root.join(&name), &upload.body).await?;
        debug!(blob = %name, bytes = upload.body.len(), "blob stored");
        Ok(format!("{PUBLIC_PREFIX}/{name}"))
    }
}
