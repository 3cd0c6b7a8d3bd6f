use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use super::FailureContext;

/// Events emitted while verifying one upload attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UploadEvent {
    Started {
        upload_id: Uuid,
        claimed_name: String,
        declared_size: Option<u64>,
    },

    /// The stream was written to staging in full
    Staged {
        upload_id: Uuid,
        bytes: u64,
    },

    Accepted {
        upload_id: Uuid,
        name: String,
        digest: String,
        bytes: u64,
        path: PathBuf,
    },

    /// `detail` is the full server-side description (digests included);
    /// `failure` is what may be shown to the client.
    Rejected {
        upload_id: Uuid,
        claimed_name: String,
        reason: String,
        detail: String,
        failure: FailureContext,
    },

    /// The attempt ended in an I/O or storage failure rather than a verdict
    Failed {
        upload_id: Uuid,
        claimed_name: String,
        failure: FailureContext,
    },
}
