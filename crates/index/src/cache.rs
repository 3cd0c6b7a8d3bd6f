//! On-disk JSON export of an index

use crate::models::ContentIndex;
use refcheck_errors::{Error, StorageError};
use refcheck_hash::HashAlgorithm;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Saves and loads the `{name: {name, hash}}` export
#[derive(Debug, Clone)]
pub struct IndexCache {
    path: PathBuf,
}

impl IndexCache {
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load a previously saved index
    ///
    /// The export does not record which algorithm produced it; it is read
    /// back under `algorithm` and only makes sense if that is the one it was
    /// built with.
    ///
    /// # Errors
    ///
    /// Returns an error if the file doesn't exist or contains invalid data.
    pub async fn load(&self, algorithm: HashAlgorithm, root: &Path) -> Result<ContentIndex, Error> {
        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, &self.path))?;

        ContentIndex::from_json(&content, algorithm, root)
    }

    /// Save an index
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created or the file cannot be written.
    pub async fn save(&self, index: &ContentIndex) -> Result<(), Error> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::IoError {
                    message: format!("failed to create cache dir: {e}"),
                })?;
        }

        let json = index.to_json()?;

        // Write to temporary file first
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, &json)
            .await
            .map_err(|e| StorageError::IoError {
                message: format!("failed to write index export: {e}"),
            })?;

        // Atomic rename
        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| StorageError::IoError {
                message: format!("failed to rename index export: {e}"),
            })?;

        tracing::debug!(path = %self.path.display(), entries = index.len(), "saved index export");
        Ok(())
    }

    /// Check if cache exists
    pub async fn exists(&self) -> bool {
        fs::metadata(&self.path).await.is_ok()
    }

    /// Remove the export, ignoring a missing file
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub async fn clear(&self) -> Result<(), Error> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::from_io_with_path(&e, &self.path).into()),
        }
    }
}
