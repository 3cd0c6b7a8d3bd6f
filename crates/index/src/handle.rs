//! Shared, swappable index handle

use crate::builder::{IndexBuilder, IndexReport};
use crate::models::ContentIndex;
use refcheck_errors::Error;
use refcheck_events::{AppEvent, EventEmitter, IndexEvent};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

/// The index every verifier reads from
///
/// Readers take an `Arc` snapshot and never hold the lock while they work.
/// Replacement swaps the whole snapshot, so a reader sees either the old
/// index or the new one, never a mixture.
#[derive(Debug, Clone)]
pub struct SharedIndex {
    inner: Arc<RwLock<Arc<ContentIndex>>>,
}

impl SharedIndex {
    #[must_use]
    pub fn new(index: impl Into<Arc<ContentIndex>>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(index.into())),
        }
    }

    /// Current snapshot
    #[must_use]
    pub fn snapshot(&self) -> Arc<ContentIndex> {
        // the guarded value is a single Arc, so a poisoned lock still holds a whole index
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Swap in a new snapshot, returning the previous one
    pub fn replace(&self, index: impl Into<Arc<ContentIndex>>) -> Arc<ContentIndex> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, index.into())
    }

    /// Rebuild from `root` and swap the result in
    ///
    /// The current snapshot stays in place if the build fails.
    ///
    /// # Errors
    ///
    /// Returns the build error.
    pub async fn reindex(&self, builder: &IndexBuilder, root: &Path) -> Result<IndexReport, Error> {
        let report = builder.build(root).await?;
        let previous = self.replace(Arc::clone(&report.index));

        tracing::info!(
            previous_entries = previous.len(),
            entries = report.index.len(),
            "content index swapped"
        );
        builder.emit(AppEvent::Index(IndexEvent::Swapped {
            previous_entries: previous.len(),
            entries: report.index.len(),
        }));
        Ok(report)
    }
}
