//! Index data models

use chrono::{DateTime, Utc};
use refcheck_errors::{Error, IndexError};
use refcheck_hash::{Hash, HashAlgorithm};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One indexed reference file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceEntry {
    /// Base filename, the key clients upload under
    pub name: String,
    pub digest: Hash,
    /// Size in bytes, unknown for entries loaded from an export
    pub size: Option<u64>,
    /// Path relative to the index root, unknown for entries loaded from an export
    pub source: Option<PathBuf>,
}

/// Exported form of an entry: `{"name": ..., "hash": ...}`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ExportEntry {
    name: String,
    hash: String,
}

/// Immutable name → digest mapping built from one pass over a reference root
#[derive(Debug, Clone)]
pub struct ContentIndex {
    algorithm: HashAlgorithm,
    root: PathBuf,
    built_at: DateTime<Utc>,
    entries: BTreeMap<String, ReferenceEntry>,
}

impl ContentIndex {
    /// Create an empty index
    #[must_use]
    pub fn new(algorithm: HashAlgorithm, root: impl Into<PathBuf>) -> Self {
        Self {
            algorithm,
            root: root.into(),
            built_at: Utc::now(),
            entries: BTreeMap::new(),
        }
    }

    /// Create an index from prepared entries; later entries replace earlier ones
    ///
    /// # Errors
    ///
    /// Returns an error if an entry digest was computed with a different
    /// algorithm than the index declares.
    pub fn from_entries<I>(
        algorithm: HashAlgorithm,
        root: impl Into<PathBuf>,
        entries: I,
    ) -> Result<Self, Error>
    where
        I: IntoIterator<Item = ReferenceEntry>,
    {
        let mut index = Self::new(algorithm, root);
        for entry in entries {
            index.insert(entry)?;
        }
        Ok(index)
    }

    /// Insert an entry, returning the one it replaced
    pub(crate) fn insert(&mut self, entry: ReferenceEntry) -> Result<Option<ReferenceEntry>, Error> {
        if entry.digest.algorithm() != self.algorithm {
            return Err(IndexError::AlgorithmMismatch {
                expected: self.algorithm.to_string(),
                actual: entry.digest.algorithm().to_string(),
            }
            .into());
        }
        Ok(self.entries.insert(entry.name.clone(), entry))
    }

    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ReferenceEntry> {
        self.entries.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, sorted by name
    pub fn entries(&self) -> impl Iterator<Item = &ReferenceEntry> {
        self.entries.values()
    }

    /// Whether two indexes map the same names to the same digests
    #[must_use]
    pub fn same_mapping(&self, other: &Self) -> bool {
        self.algorithm == other.algorithm
            && self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(other.entries.iter())
                .all(|((a, ea), (b, eb))| a == b && ea.digest == eb.digest)
    }

    /// Serialize to the pretty-printed export format
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, Error> {
        let export: BTreeMap<&str, ExportEntry> = self
            .entries
            .iter()
            .map(|(name, entry)| {
                (
                    name.as_str(),
                    ExportEntry {
                        name: entry.name.clone(),
                        hash: entry.digest.to_hex(),
                    },
                )
            })
            .collect();
        Ok(serde_json::to_string_pretty(&export)?)
    }

    /// Parse the export format back into an index
    ///
    /// The export does not record its algorithm; the caller states it.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed, a key disagrees with its
    /// entry name, or a digest is not valid hex of the right length.
    pub fn from_json(
        json: &str,
        algorithm: HashAlgorithm,
        root: impl Into<PathBuf>,
    ) -> Result<Self, Error> {
        let export: BTreeMap<String, ExportEntry> =
            serde_json::from_str(json).map_err(|e| IndexError::InvalidSnapshot {
                message: e.to_string(),
            })?;

        let mut index = Self::new(algorithm, root);
        for (key, entry) in export {
            if key != entry.name {
                return Err(IndexError::InvalidSnapshot {
                    message: format!("key {key} does not match entry name {}", entry.name),
                }
                .into());
            }
            let digest = Hash::from_hex(&entry.hash, algorithm)?;
            index.insert(ReferenceEntry {
                name: entry.name,
                digest,
                size: None,
                source: None,
            })?;
        }
        Ok(index)
    }
}
