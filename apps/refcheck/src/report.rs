//! Serializable results of CLI commands

use chrono::{DateTime, Utc};
use refcheck_errors::{Error, UserFacingError};
use refcheck_hash::Hash;
use refcheck_index::{ContentIndex, IndexReport};
use refcheck_verify::Verdict;
use serde::Serialize;
use std::path::PathBuf;

/// Result of running one command
#[derive(Debug, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum CommandResult {
    Index(IndexSummary),
    List(Listing),
    Verify(VerifySummary),
}

impl CommandResult {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Number of files that did not make it through verification
    pub fn rejected_count(&self) -> usize {
        match self {
            Self::Verify(summary) => summary
                .results
                .iter()
                .filter(|r| r.status != OutcomeStatus::Accepted)
                .count(),
            Self::Index(_) | Self::List(_) => 0,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IndexSummary {
    pub root: PathBuf,
    pub algorithm: String,
    pub built_at: DateTime<Utc>,
    pub entries: usize,
    pub skipped: Vec<SkippedFile>,
    pub shadowed: Vec<ShadowedFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct ShadowedFile {
    pub name: String,
    pub kept: PathBuf,
    pub shadowed: PathBuf,
}

impl IndexSummary {
    pub fn new(report: &IndexReport, export: Option<PathBuf>) -> Self {
        Self {
            root: report.index.root().to_path_buf(),
            algorithm: report.index.algorithm().to_string(),
            built_at: report.index.built_at(),
            entries: report.index.len(),
            skipped: report
                .skipped
                .iter()
                .map(|s| SkippedFile {
                    path: s.path.clone(),
                    reason: s.reason.clone(),
                })
                .collect(),
            shadowed: report
                .shadowed
                .iter()
                .map(|s| ShadowedFile {
                    name: s.name.clone(),
                    kept: s.kept.clone(),
                    shadowed: s.shadowed.clone(),
                })
                .collect(),
            export,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Listing {
    pub root: PathBuf,
    pub algorithm: String,
    pub files: Vec<ListedFile>,
}

#[derive(Debug, Serialize)]
pub struct ListedFile {
    pub name: String,
    pub hash: Hash,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl From<&ContentIndex> for Listing {
    fn from(index: &ContentIndex) -> Self {
        Self {
            root: index.root().to_path_buf(),
            algorithm: index.algorithm().to_string(),
            files: index
                .entries()
                .map(|e| ListedFile {
                    name: e.name.clone(),
                    hash: e.digest.clone(),
                    size: e.size,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VerifySummary {
    pub results: Vec<FileOutcome>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Accepted,
    Rejected,
    Failed,
}

/// What happened to one file passed to `refcheck verify`
#[derive(Debug, Serialize)]
pub struct FileOutcome {
    pub file: PathBuf,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stored_at: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FileOutcome {
    pub fn new(file: PathBuf, result: Result<Verdict, Error>) -> Self {
        let mut outcome = Self {
            file,
            status: OutcomeStatus::Failed,
            name: None,
            digest: None,
            stored_at: None,
            code: None,
            message: None,
        };
        match result {
            Ok(Verdict::Accepted(accepted)) => {
                outcome.status = OutcomeStatus::Accepted;
                outcome.name = Some(accepted.name);
                outcome.digest = Some(accepted.digest.to_hex());
                outcome.stored_at = Some(accepted.path);
            }
            Ok(Verdict::Rejected(rejection)) => {
                outcome.status = OutcomeStatus::Rejected;
                outcome.code = rejection.user_code().map(str::to_string);
                outcome.message = Some(rejection.user_message().into_owned());
            }
            Err(e) => {
                outcome.code = e.user_code().map(str::to_string);
                outcome.message = Some(e.user_message().into_owned());
            }
        }
        outcome
    }
}
