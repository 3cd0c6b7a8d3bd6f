use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::FailureContext;

/// Events emitted while building or replacing a content index
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IndexEvent {
    Started {
        root: PathBuf,
        algorithm: String,
    },

    /// A file could not be read or hashed and was left out of the index
    EntrySkipped {
        path: PathBuf,
        reason: String,
    },

    /// Two files share a base name; `kept` wins, `shadowed` is not indexed
    EntryShadowed {
        name: String,
        kept: PathBuf,
        shadowed: PathBuf,
    },

    Completed {
        root: PathBuf,
        entries: usize,
        skipped: usize,
        duration_ms: u64,
    },

    Failed {
        root: PathBuf,
        failure: FailureContext,
    },

    /// A freshly built snapshot replaced the one readers were using
    Swapped {
        previous_entries: usize,
        entries: usize,
    },
}
