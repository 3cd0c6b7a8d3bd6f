//! Upload rejection reasons
//!
//! `Display` carries the full detail (including both digests on a mismatch)
//! and is meant for server-side logs. Anything returned to an untrusted
//! client should go through [`UserFacingError::user_message`], which never
//! reveals the expected digest.

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadRejection {
    #[error("invalid file name: {claimed:?}")]
    InvalidName { claimed: String },

    /// `declared` is set when `size` is the length the client announced
    /// rather than bytes actually read
    #[error("upload exceeds the {limit} byte limit ({size} bytes {})", size_origin(.declared))]
    TooLarge { limit: u64, size: u64, declared: bool },

    #[error("{name} is not a known reference file")]
    UnknownFile { name: String },

    #[error("hash mismatch for {name}: expected {expected}, received {actual}")]
    HashMismatch {
        name: String,
        expected: String,
        actual: String,
    },
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn size_origin(declared: &bool) -> &'static str {
    if *declared {
        "declared"
    } else {
        "seen"
    }
}

impl UploadRejection {
    /// Short machine-readable reason, stable across releases
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::InvalidName { .. } => "invalid_name",
            Self::TooLarge { .. } => "too_large",
            Self::UnknownFile { .. } => "unknown_file",
            Self::HashMismatch { .. } => "hash_mismatch",
        }
    }
}

impl UserFacingError for UploadRejection {
    fn user_message(&self) -> Cow<'_, str> {
        match self {
            Self::InvalidName { .. } => Cow::Borrowed("invalid file name"),
            Self::TooLarge { limit, .. } => {
                Cow::Owned(format!("file too large (limit is {limit} bytes)"))
            }
            Self::UnknownFile { name } => {
                Cow::Owned(format!("{name} does not match any expected file"))
            }
            Self::HashMismatch { name, .. } => {
                Cow::Owned(format!("{name} does not match the reference copy"))
            }
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidName { .. } => Some("Upload the file under its plain file name."),
            Self::TooLarge { .. } => None,
            Self::UnknownFile { .. } => Some("Only files listed in the catalog are accepted."),
            Self::HashMismatch { .. } => {
                Some("The file was altered in transit; download a fresh copy and retry.")
            }
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::HashMismatch { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::InvalidName { .. } => "upload.invalid_name",
            Self::TooLarge { .. } => "upload.too_large",
            Self::UnknownFile { .. } => "upload.unknown_file",
            Self::HashMismatch { .. } => "upload.hash_mismatch",
        };
        Some(code)
    }
}
