//! Staging of inbound bytes before they are trusted

use refcheck_errors::{Error, StorageError, UploadRejection};
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;
use tempfile::TempPath;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use uuid::Uuid;

const CHUNK_SIZE: usize = 64 * 1024;

/// Bytes of one upload sitting in the staging directory
///
/// The staged file is removed when this value is dropped, unless it has been
/// promoted first.
#[derive(Debug)]
pub struct StagedUpload {
    path: TempPath,
    bytes: u64,
}

impl StagedUpload {
    /// Copy `reader` into a fresh file under `staging_dir`
    ///
    /// The file is named after `upload_id`. Reading stops as soon as more
    /// than `limit` bytes have arrived, and fails if no data arrives within
    /// `stall_timeout`; in both cases the partial file is removed.
    ///
    /// # Errors
    ///
    /// Returns [`UploadRejection::TooLarge`] if the stream exceeds `limit`,
    /// an `Io` error of kind `TimedOut` if it stalls, and a storage error if
    /// the staging file cannot be created or written.
    pub async fn stage<R>(
        mut reader: R,
        staging_dir: &Path,
        upload_id: Uuid,
        limit: u64,
        stall_timeout: Duration,
    ) -> Result<Self, Error>
    where
        R: AsyncRead + Unpin,
    {
        let (file, path) = tempfile::Builder::new()
            .prefix(&format!("{upload_id}-"))
            .suffix(".part")
            .tempfile_in(staging_dir)
            .map_err(|e| StorageError::StagingFailed {
                path: staging_dir.display().to_string(),
                message: e.to_string(),
            })?
            .into_parts();
        let mut file = fs::File::from_std(file);

        let mut buffer = vec![0u8; CHUNK_SIZE];
        let mut received = 0u64;
        loop {
            let n = match tokio::time::timeout(stall_timeout, reader.read(&mut buffer)).await {
                Ok(read) => read?,
                Err(_) => {
                    return Err(Error::Io {
                        kind: ErrorKind::TimedOut,
                        message: format!(
                            "no data received for {} seconds",
                            stall_timeout.as_secs()
                        ),
                        path: None,
                    })
                }
            };
            if n == 0 {
                break;
            }

            received += n as u64;
            if received > limit {
                return Err(UploadRejection::TooLarge {
                    limit,
                    size: received,
                    declared: false,
                }
                .into());
            }

            file.write_all(&buffer[..n])
                .await
                .map_err(|e| staging_failed(&path, &e))?;
        }

        file.flush().await.map_err(|e| staging_failed(&path, &e))?;
        file.sync_all().await.map_err(|e| staging_failed(&path, &e))?;

        Ok(Self {
            path,
            bytes: received,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Move the staged bytes to `dest`, replacing any file already there
    ///
    /// A rename is tried first. When staging and `dest` sit on different
    /// filesystems the bytes are copied next to `dest` under a temporary name
    /// and renamed into place, so `dest` never holds a partial file.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::PromotionFailed`] if the bytes cannot be moved.
    /// The staged file is removed either way.
    pub async fn promote(self, dest: &Path) -> Result<(), Error> {
        let path = match self.path.persist(dest) {
            Ok(()) => return Ok(()),
            Err(e) if e.error.kind() == ErrorKind::CrossesDevices => e.path,
            Err(e) => return Err(promotion_failed(dest, &e.error)),
        };

        let parent = dest.parent().unwrap_or_else(|| Path::new("."));
        let temp_path = parent.join(format!(".{}.tmp", Uuid::new_v4()));

        if let Err(e) = fs::copy(&path, &temp_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(promotion_failed(dest, &e));
        }
        if let Err(e) = fs::rename(&temp_path, dest).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(promotion_failed(dest, &e));
        }

        tracing::debug!(dest = %dest.display(), "promoted staged upload by copy");
        drop(path);
        Ok(())
    }
}

fn staging_failed(path: &Path, err: &std::io::Error) -> Error {
    StorageError::StagingFailed {
        path: path.display().to_string(),
        message: err.to_string(),
    }
    .into()
}

fn promotion_failed(dest: &Path, err: &std::io::Error) -> Error {
    StorageError::PromotionFailed {
        path: dest.display().to_string(),
        message: err.to_string(),
    }
    .into()
}
