//! Structured logging integration for events
//!
//! Converts domain events into tracing records with structured fields so
//! that `--debug` output can be consumed by log tooling.

use refcheck_events::{AppEvent, EventMessage, IndexEvent, UploadEvent};
use tracing::{debug, error, info, warn};

/// Log an event using the tracing infrastructure with structured fields
pub fn log_event_with_tracing(message: &EventMessage) {
    let event = &message.event;
    let meta = &message.meta;

    match event {
        AppEvent::Index(index_event) => match index_event {
            IndexEvent::Started { root, algorithm } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    root = %root.display(),
                    algorithm = %algorithm,
                    "Indexing started"
                );
            }
            IndexEvent::EntrySkipped { path, reason } => {
                warn!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    path = %path.display(),
                    reason = %reason,
                    "Reference entry skipped"
                );
            }
            IndexEvent::EntryShadowed {
                name,
                kept,
                shadowed,
            } => {
                warn!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    name = %name,
                    kept = %kept.display(),
                    shadowed = %shadowed.display(),
                    "Duplicate reference name"
                );
            }
            IndexEvent::Completed {
                root,
                entries,
                skipped,
                duration_ms,
            } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    root = %root.display(),
                    entries,
                    skipped,
                    duration_ms,
                    "Indexing completed"
                );
            }
            IndexEvent::Failed { root, failure } => {
                error!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    root = %root.display(),
                    code = ?failure.code,
                    message = %failure.message,
                    "Indexing failed"
                );
            }
            IndexEvent::Swapped {
                previous_entries,
                entries,
            } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    previous_entries,
                    entries,
                    "Index snapshot swapped"
                );
            }
        },

        AppEvent::Upload(upload_event) => match upload_event {
            UploadEvent::Started {
                upload_id,
                claimed_name,
                declared_size,
            } => {
                debug!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    upload_id = %upload_id,
                    claimed_name = %claimed_name,
                    declared_size = ?declared_size,
                    "Upload started"
                );
            }
            UploadEvent::Staged { upload_id, bytes } => {
                debug!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    upload_id = %upload_id,
                    bytes,
                    "Upload staged"
                );
            }
            UploadEvent::Accepted {
                upload_id,
                name,
                digest,
                bytes,
                path,
            } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    upload_id = %upload_id,
                    name = %name,
                    digest = %digest,
                    bytes,
                    path = %path.display(),
                    "Upload accepted"
                );
            }
            UploadEvent::Rejected {
                upload_id,
                claimed_name,
                reason,
                detail,
                ..
            } => {
                warn!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    upload_id = %upload_id,
                    claimed_name = %claimed_name,
                    reason = %reason,
                    detail = %detail,
                    "Upload rejected"
                );
            }
            UploadEvent::Failed {
                upload_id,
                claimed_name,
                failure,
            } => {
                error!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    upload_id = %upload_id,
                    claimed_name = %claimed_name,
                    code = ?failure.code,
                    message = %failure.message,
                    "Upload failed"
                );
            }
        },
    }
}
