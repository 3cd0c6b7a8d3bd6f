//! Content index error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum IndexError {
    /// The reference root is missing, unreadable or not a directory. Always fatal.
    #[error("reference directory {path} is unusable: {message}")]
    RootUnreadable { path: String, message: String },

    /// A single entry below the root could not be read or hashed.
    #[error("failed to index {path}: {message}")]
    EntryUnreadable { path: String, message: String },

    /// Digests computed under different algorithms were about to be compared.
    #[error("hash algorithm mismatch: index uses {expected}, got {actual}")]
    AlgorithmMismatch { expected: String, actual: String },

    #[error("invalid index snapshot: {message}")]
    InvalidSnapshot { message: String },
}

impl UserFacingError for IndexError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::RootUnreadable { .. } => {
                Some("Check that the reference directory exists and is readable.")
            }
            Self::EntryUnreadable { .. } => {
                Some("Fix the file permissions or set `on_error = \"skip\"` under [index].")
            }
            Self::AlgorithmMismatch { .. } | Self::InvalidSnapshot { .. } => {
                Some("Rebuild the index from the reference directory.")
            }
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::RootUnreadable { .. } => "index.root_unreadable",
            Self::EntryUnreadable { .. } => "index.entry_unreadable",
            Self::AlgorithmMismatch { .. } => "index.algorithm_mismatch",
            Self::InvalidSnapshot { .. } => "index.invalid_snapshot",
        };
        Some(code)
    }
}
