use serde::{Deserialize, Serialize};

use crate::EventSource;
use refcheck_errors::UserFacingError;

/// Structured failure information shared across domains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short user-facing message.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    pub retryable: bool,
}

impl FailureContext {
    #[must_use]
    pub fn new(
        code: Option<impl Into<String>>,
        message: impl Into<String>,
        hint: Option<impl Into<String>>,
        retryable: bool,
    ) -> Self {
        Self {
            code: code.map(Into::into),
            message: message.into(),
            hint: hint.map(Into::into),
            retryable,
        }
    }

    /// Build failure context from a `UserFacingError` implementation.
    #[must_use]
    pub fn from_error<E: UserFacingError + ?Sized>(error: &E) -> Self {
        Self::new(
            error.user_code(),
            error.user_message().into_owned(),
            error.user_hint(),
            error.is_retryable(),
        )
    }
}

pub mod index;
pub mod upload;

pub use index::*;
pub use upload::*;

/// Top-level application event enum that aggregates all domain-specific events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// Content indexing of the reference directory
    Index(IndexEvent),

    /// Verification of inbound uploads
    Upload(UploadEvent),
}

impl AppEvent {
    /// Identify the source domain for this event (used for metadata/logging).
    #[must_use]
    pub fn event_source(&self) -> EventSource {
        match self {
            Self::Index(_) => EventSource::Index,
            Self::Upload(_) => EventSource::Upload,
        }
    }

    /// Determine the appropriate tracing log level for this event
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        use tracing::Level;

        match self {
            Self::Index(IndexEvent::Failed { .. })
            | Self::Upload(UploadEvent::Failed { .. }) => Level::ERROR,

            Self::Index(IndexEvent::EntrySkipped { .. } | IndexEvent::EntryShadowed { .. })
            | Self::Upload(UploadEvent::Rejected { .. }) => Level::WARN,

            Self::Upload(UploadEvent::Started { .. } | UploadEvent::Staged { .. }) => Level::DEBUG,

            _ => Level::INFO,
        }
    }
}
