#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Shared type definitions for refcheck
//!
//! Small enums that several crates (and the configuration file) need to
//! agree on live here so that no crate has to depend on another just to
//! name a setting.

use serde::{Deserialize, Serialize};

/// What the indexer does when a single file below the reference root
/// cannot be read or hashed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexErrorPolicy {
    /// Abort the whole indexing pass with the first failure
    Fail,
    /// Leave the file out, record it in the skipped list and log a warning.
    /// Every later upload under that name will be rejected as unknown.
    Skip,
}

impl Default for IndexErrorPolicy {
    fn default() -> Self {
        Self::Fail
    }
}

impl std::fmt::Display for IndexErrorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fail => write!(f, "fail"),
            Self::Skip => write!(f, "skip"),
        }
    }
}

impl clap::ValueEnum for IndexErrorPolicy {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Fail, Self::Skip]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Self::Fail => clap::builder::PossibleValue::new("fail"),
            Self::Skip => clap::builder::PossibleValue::new("skip"),
        })
    }
}

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Plain,
    Tty,
    Json,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Tty
    }
}
