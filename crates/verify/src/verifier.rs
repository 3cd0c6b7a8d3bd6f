//! Accept or reject one upload against a content index

use crate::name::sanitize_name;
use crate::staging::StagedUpload;
use refcheck_config::{constants, Config};
use refcheck_errors::{Error, UploadRejection};
use refcheck_events::{AppEvent, EventEmitter, EventSender, FailureContext, UploadEvent};
use refcheck_hash::Hash;
use refcheck_index::{ContentIndex, SharedIndex};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncRead;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Where uploads are staged and kept, and the limits applied to them
#[derive(Debug, Clone)]
pub struct VerifierOptions {
    /// Must not be the reference directory; same filesystem as
    /// `accepted_dir` keeps promotion a rename
    pub staging_dir: PathBuf,
    pub accepted_dir: PathBuf,
    pub max_upload_size: u64,
    pub stall_timeout: Duration,
}

impl Default for VerifierOptions {
    fn default() -> Self {
        Self {
            staging_dir: PathBuf::from(constants::DEFAULT_STAGING_DIR),
            accepted_dir: PathBuf::from(constants::DEFAULT_ACCEPTED_DIR),
            max_upload_size: constants::DEFAULT_MAX_UPLOAD_SIZE,
            stall_timeout: Duration::from_secs(constants::DEFAULT_STALL_TIMEOUT_SECS),
        }
    }
}

impl From<&Config> for VerifierOptions {
    fn from(config: &Config) -> Self {
        Self {
            staging_dir: config.staging_dir(),
            accepted_dir: config.accepted_dir(),
            max_upload_size: config.upload.max_upload_size,
            stall_timeout: config.stall_timeout(),
        }
    }
}

/// An upload whose bytes matched the reference copy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedUpload {
    pub upload_id: Uuid,
    pub name: String,
    pub digest: Hash,
    pub size: u64,
    /// Final location under the accepted directory
    pub path: PathBuf,
}

/// Outcome of a verification that ran to completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted(AcceptedUpload),
    Rejected(UploadRejection),
}

impl Verdict {
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    #[must_use]
    pub fn rejection(&self) -> Option<&UploadRejection> {
        match self {
            Self::Accepted(_) => None,
            Self::Rejected(rejection) => Some(rejection),
        }
    }

    /// Treat a rejection as an error
    ///
    /// # Errors
    ///
    /// Returns [`Error::Upload`] if the upload was rejected.
    pub fn into_result(self) -> Result<AcceptedUpload, Error> {
        match self {
            Self::Accepted(accepted) => Ok(accepted),
            Self::Rejected(rejection) => Err(rejection.into()),
        }
    }
}

/// Verifies uploads against the current snapshot of a [`SharedIndex`]
#[derive(Debug, Clone)]
pub struct UploadVerifier {
    index: SharedIndex,
    options: VerifierOptions,
    tx: Option<EventSender>,
}

impl EventEmitter for UploadVerifier {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

impl UploadVerifier {
    #[must_use]
    pub fn new(index: SharedIndex, options: VerifierOptions) -> Self {
        Self {
            index,
            options,
            tx: None,
        }
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    #[must_use]
    pub fn options(&self) -> &VerifierOptions {
        &self.options
    }

    #[must_use]
    pub fn index(&self) -> &SharedIndex {
        &self.index
    }

    /// Create the staging and accepted directories
    ///
    /// # Errors
    ///
    /// Returns an error if either directory cannot be created.
    pub async fn prepare(&self) -> Result<(), Error> {
        for dir in [&self.options.staging_dir, &self.options.accepted_dir] {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| Error::io_with_path(&e, dir))?;
        }
        Ok(())
    }

    /// Verify one upload
    ///
    /// The index snapshot is taken once, so a re-index that lands while the
    /// upload is in flight does not affect this attempt. Dropping the returned
    /// future discards any staged bytes.
    ///
    /// Concurrent uploads of one name are not serialized. The last attempt to
    /// finish decides what `accepted_dir/<name>` holds: an accept promotes its
    /// bytes there, a rejection removes whatever an earlier accept left.
    ///
    /// # Errors
    ///
    /// Returns an error only for I/O and storage failures; every rejection is
    /// reported as [`Verdict::Rejected`].
    pub async fn verify<R>(
        &self,
        claimed_name: &str,
        declared_len: Option<u64>,
        reader: R,
    ) -> Result<Verdict, Error>
    where
        R: AsyncRead + Unpin,
    {
        let snapshot = self.index.snapshot();
        run(&snapshot, &self.options, &self.tx, claimed_name, declared_len, reader).await
    }

    /// Verify a local file as if it had been uploaded
    ///
    /// The claimed name defaults to the file's own name.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, or for any error
    /// [`UploadVerifier::verify`] returns.
    pub async fn verify_file(
        &self,
        path: &Path,
        claimed_name: Option<&str>,
    ) -> Result<Verdict, Error> {
        let file = fs::File::open(path)
            .await
            .map_err(|e| Error::io_with_path(&e, path))?;
        let declared_len = file.metadata().await.ok().map(|m| m.len());

        let own_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let claimed = claimed_name.unwrap_or(&own_name);

        self.verify(claimed, declared_len, file).await
    }
}

/// Verify one upload against a snapshot the caller already holds
///
/// No events are emitted.
///
/// # Errors
///
/// Same as [`UploadVerifier::verify`].
pub async fn verify_with_index<R>(
    index: &ContentIndex,
    options: &VerifierOptions,
    claimed_name: &str,
    declared_len: Option<u64>,
    reader: R,
) -> Result<Verdict, Error>
where
    R: AsyncRead + Unpin,
{
    run(index, options, &None, claimed_name, declared_len, reader).await
}

#[allow(clippy::ref_option)]
async fn run<R>(
    index: &ContentIndex,
    options: &VerifierOptions,
    events: &Option<EventSender>,
    claimed_name: &str,
    declared_len: Option<u64>,
    reader: R,
) -> Result<Verdict, Error>
where
    R: AsyncRead + Unpin,
{
    let upload_id = Uuid::new_v4();
    let correlation = upload_id.to_string();
    events.emit_correlated(
        AppEvent::Upload(UploadEvent::Started {
            upload_id,
            claimed_name: claimed_name.to_string(),
            declared_size: declared_len,
        }),
        correlation.clone(),
    );

    let outcome = attempt(
        index,
        options,
        events,
        upload_id,
        claimed_name,
        declared_len,
        reader,
    )
    .await;

    match &outcome {
        Ok(Verdict::Accepted(accepted)) => {
            info!(
                %upload_id,
                name = %accepted.name,
                digest = %accepted.digest,
                bytes = accepted.size,
                "upload accepted"
            );
            events.emit_correlated(
                AppEvent::Upload(UploadEvent::Accepted {
                    upload_id,
                    name: accepted.name.clone(),
                    digest: accepted.digest.to_hex(),
                    bytes: accepted.size,
                    path: accepted.path.clone(),
                }),
                correlation,
            );
        }
        Ok(Verdict::Rejected(rejection)) => {
            warn!(
                %upload_id,
                claimed_name,
                reason = rejection.reason(),
                "upload rejected: {rejection}"
            );
            events.emit_correlated(
                AppEvent::Upload(UploadEvent::Rejected {
                    upload_id,
                    claimed_name: claimed_name.to_string(),
                    reason: rejection.reason().to_string(),
                    detail: rejection.to_string(),
                    failure: FailureContext::from_error(rejection),
                }),
                correlation,
            );
        }
        Err(e) => {
            error!(%upload_id, claimed_name, "upload failed: {e}");
            events.emit_correlated(
                AppEvent::Upload(UploadEvent::Failed {
                    upload_id,
                    claimed_name: claimed_name.to_string(),
                    failure: FailureContext::from_error(e),
                }),
                correlation,
            );
        }
    }

    outcome
}

#[allow(clippy::ref_option)]
async fn attempt<R>(
    index: &ContentIndex,
    options: &VerifierOptions,
    events: &Option<EventSender>,
    upload_id: Uuid,
    claimed_name: &str,
    declared_len: Option<u64>,
    reader: R,
) -> Result<Verdict, Error>
where
    R: AsyncRead + Unpin,
{
    let name = match sanitize_name(claimed_name) {
        Ok(name) => name,
        Err(rejection) => return Ok(Verdict::Rejected(rejection)),
    };

    let verdict = judge(index, options, events, upload_id, name, declared_len, reader).await?;
    if !verdict.is_accepted() {
        discard_accepted(&options.accepted_dir.join(name)).await?;
    }
    Ok(verdict)
}

/// Remove a previously accepted copy so a rejected name leaves nothing behind
///
/// Only regular files are removed; a directory such as the staging area is
/// never an accepted upload.
async fn discard_accepted(dest: &Path) -> Result<(), Error> {
    match fs::symlink_metadata(dest).await {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => return Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(Error::io_with_path(&e, dest)),
    }

    match fs::remove_file(dest).await {
        Ok(()) => {
            debug!(path = %dest.display(), "removed earlier accepted copy");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::io_with_path(&e, dest)),
    }
}

#[allow(clippy::ref_option)]
async fn judge<R>(
    index: &ContentIndex,
    options: &VerifierOptions,
    events: &Option<EventSender>,
    upload_id: Uuid,
    name: &str,
    declared_len: Option<u64>,
    reader: R,
) -> Result<Verdict, Error>
where
    R: AsyncRead + Unpin,
{
    let limit = options.max_upload_size;
    if let Some(declared) = declared_len.filter(|&len| len > limit) {
        return Ok(Verdict::Rejected(UploadRejection::TooLarge {
            limit,
            size: declared,
            declared: true,
        }));
    }

    let staged = match StagedUpload::stage(
        reader,
        &options.staging_dir,
        upload_id,
        limit,
        options.stall_timeout,
    )
    .await
    {
        Ok(staged) => staged,
        Err(Error::Upload(rejection)) => return Ok(Verdict::Rejected(rejection)),
        Err(e) => return Err(e),
    };
    debug!(%upload_id, bytes = staged.bytes(), path = %staged.path().display(), "upload staged");
    events.emit_correlated(
        AppEvent::Upload(UploadEvent::Staged {
            upload_id,
            bytes: staged.bytes(),
        }),
        upload_id.to_string(),
    );

    let digest = Hash::hash_file(staged.path(), index.algorithm()).await?;

    // staged bytes are removed when `staged` drops on any early return
    let Some(expected) = index.get(name) else {
        return Ok(Verdict::Rejected(UploadRejection::UnknownFile {
            name: name.to_string(),
        }));
    };
    if expected.digest != digest {
        return Ok(Verdict::Rejected(UploadRejection::HashMismatch {
            name: name.to_string(),
            expected: expected.digest.to_hex(),
            actual: digest.to_hex(),
        }));
    }

    let size = staged.bytes();
    let dest = options.accepted_dir.join(name);
    staged.promote(&dest).await?;

    Ok(Verdict::Accepted(AcceptedUpload {
        upload_id,
        name: name.to_string(),
        digest,
        size,
        path: dest,
    }))
}
