//! Attachment storage for report files, chat uploads and avatars.
//!
//! Rows keep a path relative to the store root; [`BlobStore`] turns that
//! path back into bytes. The local implementation writes under a data
//! directory with time-derived names and never overwrites an existing file.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

/// Longest file extension carried over from the uploaded name.
const MAX_EXTENSION_LEN: usize = 10;

/// Attempts at finding an unused file name before giving up.
const MAX_NAME_ATTEMPTS: u32 = 16;

#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid file path: {0}")]
    InvalidPath(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where a saved blob ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    /// Path relative to the store root, always `/`-separated.
    pub path: String,
    pub size: i64,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Persist `bytes` under `category`, keeping the extension of
    /// `original_name`.
    async fn save(
        &self,
        category: &str,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<StoredBlob, BlobError>;

    async fn read(&self, path: &str) -> Result<Vec<u8>, BlobError>;

    /// Remove a blob. Missing files are not an error.
    async fn remove(&self, path: &str) -> Result<(), BlobError>;
}

/// Filesystem-backed store rooted at a data directory.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, relative: &str) -> Result<PathBuf, BlobError> {
        let candidate = Path::new(relative);
        let safe = !relative.is_empty()
            && candidate
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(BlobError::InvalidPath(relative.to_string()));
        }
        Ok(self.root.join(candidate))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn save(
        &self,
        category: &str,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<StoredBlob, BlobError> {
        let category = sanitize_segment(category);
        let dir = self.root.join(&category);
        tokio::fs::create_dir_all(&dir).await?;

        let ext = extension_of(original_name);
        let stamp = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = if attempt == 0 {
                format!("{category}_{stamp}{ext}")
            } else {
                format!("{category}_{stamp}_{attempt}{ext}")
            };
            let full = dir.join(&name);
            let opened = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&full)
                .await;
            let mut file = match opened {
                Ok(file) => file,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            };
            file.write_all(bytes).await?;
            file.flush().await?;

            let path = format!("{category}/{name}");
            tracing::debug!(path = %path, size = bytes.len(), "Stored blob");
            return Ok(StoredBlob {
                path,
                size: bytes.len() as i64,
            });
        }

        Err(BlobError::Io(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            "could not find an unused file name",
        )))
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>, BlobError> {
        let full = self.resolve(path)?;
        match tokio::fs::read(&full).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BlobError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, path: &str) -> Result<(), BlobError> {
        let full = self.resolve(path)?;
        match tokio::fs::remove_file(&full).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// `.ext` taken from an uploaded name, lowercased, or empty when the name
/// has no usable extension.
pub fn extension_of(original_name: &str) -> String {
    let ext = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");
    if ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return String::new();
    }
    format!(".{}", ext.to_ascii_lowercase())
}

fn sanitize_segment(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if cleaned.is_empty() {
        "files".to_string()
    } else {
        cleaned
    }
}
