//! Local-disk storage for uploaded record images.

use std::path::{Path, PathBuf};

use folio_core::upload::{is_safe_filename, stored_filename};

/// Errors from the upload storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid stored file name '{0}'")]
    InvalidName(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes uploads into one directory served under a public URL prefix.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
    public_prefix: String,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_prefix: public_prefix.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the storage directory if needed.
    pub async fn ensure_root(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Store bytes under a generated name with the given extension.
    ///
    /// Returns the stored file name.
    pub async fn save(&self, extension: &str, bytes: &[u8]) -> Result<String, StorageError> {
        self.ensure_root().await?;
        let filename = stored_filename(extension);
        tokio::fs::write(self.root.join(&filename), bytes).await?;
        tracing::debug!(%filename, size = bytes.len(), "Stored upload");
        Ok(filename)
    }

    /// Remove a stored file. A file that is already gone is not an error.
    pub async fn remove(&self, filename: &str) -> Result<(), StorageError> {
        if !is_safe_filename(filename) {
            return Err(StorageError::InvalidName(filename.to_string()));
        }
        match tokio::fs::remove_file(self.root.join(filename)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a stored file, logging instead of failing.
    ///
    /// Used after the owning record is already gone, when the request must
    /// succeed regardless.
    pub async fn remove_logged(&self, filename: &str) {
        if let Err(e) = self.remove(filename).await {
            tracing::warn!(%filename, error = %e, "Failed to remove stored upload");
        }
    }

    /// Public URL of a stored file.
    pub fn url_for(&self, filename: &str) -> String {
        format!("{}/{filename}", self.public_prefix.trim_end_matches('/'))
    }
}
