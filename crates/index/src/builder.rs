//! Walk a reference root and hash every regular file under it

use crate::models::{ContentIndex, ReferenceEntry};
use refcheck_errors::{Error, IndexError};
use refcheck_events::{AppEvent, EventEmitter, EventSender, FailureContext, IndexEvent};
use refcheck_hash::{Hash, HashAlgorithm};
use refcheck_types::IndexErrorPolicy;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::fs;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, trace, warn};

/// Default number of files hashed at once
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// How an index is built
#[derive(Debug, Clone)]
pub struct IndexOptions {
    pub algorithm: HashAlgorithm,
    pub on_error: IndexErrorPolicy,
    pub max_concurrency: usize,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::default(),
            on_error: IndexErrorPolicy::default(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

/// A file left out of the index under [`IndexErrorPolicy::Skip`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub path: PathBuf,
    pub reason: String,
}

/// A file hidden by another file with the same base name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowedEntry {
    pub name: String,
    /// Relative path of the file that is indexed under `name`
    pub kept: PathBuf,
    /// Relative path of the file that lost
    pub shadowed: PathBuf,
}

/// Result of one indexing pass
#[derive(Debug, Clone)]
pub struct IndexReport {
    pub index: Arc<ContentIndex>,
    pub skipped: Vec<SkippedEntry>,
    pub shadowed: Vec<ShadowedEntry>,
}

/// Builds [`ContentIndex`] snapshots
#[derive(Debug, Clone, Default)]
pub struct IndexBuilder {
    options: IndexOptions,
    tx: Option<EventSender>,
}

impl EventEmitter for IndexBuilder {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

#[derive(Default)]
struct Walk {
    files: Vec<PathBuf>,
    failures: Vec<(PathBuf, String)>,
}

impl IndexBuilder {
    #[must_use]
    pub fn new(options: IndexOptions) -> Self {
        Self { options, tx: None }
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    #[must_use]
    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    /// Build an index of every regular file below `root`
    ///
    /// Directories are descended, symlinks and special files are ignored.
    /// Entries are keyed by base filename; when two files share one, the
    /// file with the greater relative path wins and the other is reported
    /// in [`IndexReport::shadowed`]. The source tree is never modified.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` is missing, unreadable or not a directory,
    /// or if any entry fails under [`IndexErrorPolicy::Fail`].
    pub async fn build(&self, root: &Path) -> Result<IndexReport, Error> {
        let started = Instant::now();
        self.emit(AppEvent::Index(IndexEvent::Started {
            root: root.to_path_buf(),
            algorithm: self.options.algorithm.to_string(),
        }));

        match self.build_inner(root).await {
            Ok(report) => {
                let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                info!(
                    root = %root.display(),
                    entries = report.index.len(),
                    skipped = report.skipped.len(),
                    shadowed = report.shadowed.len(),
                    duration_ms,
                    "content index built"
                );
                self.emit(AppEvent::Index(IndexEvent::Completed {
                    root: root.to_path_buf(),
                    entries: report.index.len(),
                    skipped: report.skipped.len(),
                    duration_ms,
                }));
                Ok(report)
            }
            Err(e) => {
                self.emit(AppEvent::Index(IndexEvent::Failed {
                    root: root.to_path_buf(),
                    failure: FailureContext::from_error(&e),
                }));
                Err(e)
            }
        }
    }

    async fn build_inner(&self, root: &Path) -> Result<IndexReport, Error> {
        let metadata = fs::metadata(root)
            .await
            .map_err(|e| root_unreadable(root, e.to_string()))?;
        if !metadata.is_dir() {
            return Err(root_unreadable(root, "not a directory".to_string()));
        }

        let mut walk = walk(root).await?;
        let mut skipped = Vec::new();
        for (path, reason) in std::mem::take(&mut walk.failures) {
            self.entry_failed(path, reason, &mut skipped)?;
        }

        // apply order decides which duplicate wins
        walk.files.sort();
        let hashed = self.hash_all(&walk.files).await?;

        let mut index = ContentIndex::new(self.options.algorithm, root);
        let mut shadowed = Vec::new();
        for (position, result) in hashed {
            let path = &walk.files[position];
            let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();

            let (digest, size) = match result {
                Ok(hashed) => hashed,
                Err(e) => {
                    self.entry_failed(relative, e.to_string(), &mut skipped)?;
                    continue;
                }
            };
            let Some(name) = path.file_name().and_then(OsStr::to_str) else {
                self.entry_failed(
                    relative,
                    "file name is not valid UTF-8".to_string(),
                    &mut skipped,
                )?;
                continue;
            };

            debug!("{name} -> {digest}");
            let previous = index.insert(ReferenceEntry {
                name: name.to_string(),
                digest,
                size: Some(size),
                source: Some(relative.clone()),
            })?;

            if let Some(previous) = previous {
                let lost = previous.source.unwrap_or_default();
                warn!(
                    name,
                    kept = %relative.display(),
                    shadowed = %lost.display(),
                    "duplicate file name in reference directory"
                );
                self.emit(AppEvent::Index(IndexEvent::EntryShadowed {
                    name: name.to_string(),
                    kept: relative.clone(),
                    shadowed: lost.clone(),
                }));
                shadowed.push(ShadowedEntry {
                    name: name.to_string(),
                    kept: relative,
                    shadowed: lost,
                });
            }
        }

        Ok(IndexReport {
            index: Arc::new(index),
            skipped,
            shadowed,
        })
    }

    /// Hash files concurrently, returning results tagged with their position
    async fn hash_all(
        &self,
        files: &[PathBuf],
    ) -> Result<Vec<(usize, Result<(Hash, u64), Error>)>, Error> {
        let semaphore = Arc::new(Semaphore::new(self.options.max_concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for (position, path) in files.iter().enumerate() {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| Error::internal(format!("semaphore acquire error: {e}")))?;
            let path = path.clone();
            let algorithm = self.options.algorithm;

            tasks.spawn(async move {
                let _permit = permit;
                (position, Hash::hash_file_with_len(&path, algorithm).await)
            });
        }

        let mut results = Vec::with_capacity(files.len());
        while let Some(joined) = tasks.join_next().await {
            results.push(joined.map_err(|e| Error::internal(format!("task join error: {e}")))?);
        }
        results.sort_by_key(|(position, _)| *position);
        Ok(results)
    }

    fn entry_failed(
        &self,
        path: PathBuf,
        reason: String,
        skipped: &mut Vec<SkippedEntry>,
    ) -> Result<(), Error> {
        match self.options.on_error {
            IndexErrorPolicy::Fail => Err(IndexError::EntryUnreadable {
                path: path.display().to_string(),
                message: reason,
            }
            .into()),
            IndexErrorPolicy::Skip => {
                warn!(path = %path.display(), reason = %reason, "skipping unreadable reference entry");
                self.emit(AppEvent::Index(IndexEvent::EntrySkipped {
                    path: path.clone(),
                    reason: reason.clone(),
                }));
                skipped.push(SkippedEntry { path, reason });
                Ok(())
            }
        }
    }
}

/// Collect regular files below `root` without following symlinks
async fn walk(root: &Path) -> Result<Walk, Error> {
    let mut walk = Walk::default();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if dir == root => return Err(root_unreadable(root, e.to_string())),
            Err(e) => {
                walk.failures.push((relative_to(root, &dir), e.to_string()));
                continue;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    walk.failures.push((relative_to(root, &dir), e.to_string()));
                    break;
                }
            };
            let path = entry.path();
            match entry.file_type().await {
                Ok(file_type) if file_type.is_dir() => pending.push(path),
                Ok(file_type) if file_type.is_file() => walk.files.push(path),
                Ok(_) => trace!(path = %path.display(), "ignoring non-regular entry"),
                Err(e) => walk.failures.push((relative_to(root, &path), e.to_string())),
            }
        }
    }

    Ok(walk)
}

fn relative_to(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}

fn root_unreadable(root: &Path, message: String) -> Error {
    IndexError::RootUnreadable {
        path: root.display().to_string(),
        message,
    }
    .into()
}
