#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for refcheck
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/refcheck/config.toml)
//! - CLI flags (applied by the caller)

pub mod constants;

use refcheck_errors::{ConfigError, Error};
use refcheck_hash::HashAlgorithm;
use refcheck_types::IndexErrorPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use constants::{
    DEFAULT_ACCEPTED_DIR, DEFAULT_INDEX_CONCURRENCY, DEFAULT_MAX_UPLOAD_SIZE,
    DEFAULT_REFERENCE_DIR, DEFAULT_STAGING_DIR, DEFAULT_STALL_TIMEOUT_SECS,
};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub paths: PathConfig,

    #[serde(default)]
    pub upload: UploadConfig,

    #[serde(default)]
    pub index: IndexConfig,
}

/// Path configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathConfig {
    pub reference_dir: Option<PathBuf>,
    pub staging_dir: Option<PathBuf>,
    pub accepted_dir: Option<PathBuf>,
    /// Where `refcheck index --export` and the index cache live, if anywhere
    pub index_cache: Option<PathBuf>,
}

/// Upload limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64, // bytes
    #[serde(default = "default_stall_timeout_secs")]
    pub stall_timeout_secs: u64,
}

/// Content index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default)]
    pub algorithm: HashAlgorithm,
    #[serde(default)]
    pub on_error: IndexErrorPolicy,
    #[serde(default = "default_index_concurrency")]
    pub max_concurrency: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
            stall_timeout_secs: DEFAULT_STALL_TIMEOUT_SECS,
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::default(),
            on_error: IndexErrorPolicy::default(),
            max_concurrency: DEFAULT_INDEX_CONCURRENCY,
        }
    }
}

// Default value functions for serde
fn default_max_upload_size() -> u64 {
    DEFAULT_MAX_UPLOAD_SIZE
}

fn default_stall_timeout_secs() -> u64 {
    DEFAULT_STALL_TIMEOUT_SECS
}

fn default_index_concurrency() -> usize {
    DEFAULT_INDEX_CONCURRENCY
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("refcheck").join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// holds values that fail validation.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        config.validate()?;

        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or parsed.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if fs::try_exists(&config_path).await.unwrap_or(false) {
            Self::load_from_file(&config_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Reject values that would make the verifier or indexer unusable
    ///
    /// # Errors
    ///
    /// Returns an error naming the first offending field.
    pub fn validate(&self) -> Result<(), Error> {
        if self.upload.max_upload_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "upload.max_upload_size".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        if self.upload.stall_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "upload.stall_timeout_secs".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        if self.index.max_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "index.max_concurrency".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        if self.staging_dir() == self.reference_dir() {
            return Err(ConfigError::Invalid {
                message: "staging_dir must differ from reference_dir".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Get the reference directory (with default)
    #[must_use]
    pub fn reference_dir(&self) -> PathBuf {
        self.paths
            .reference_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_REFERENCE_DIR))
    }

    /// Get the staging directory (with default)
    #[must_use]
    pub fn staging_dir(&self) -> PathBuf {
        self.paths
            .staging_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STAGING_DIR))
    }

    /// Get the accepted-uploads directory (with default)
    #[must_use]
    pub fn accepted_dir(&self) -> PathBuf {
        self.paths
            .accepted_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ACCEPTED_DIR))
    }

    /// Get the index cache file, if one is configured
    #[must_use]
    pub fn index_cache(&self) -> Option<&Path> {
        self.paths.index_cache.as_deref()
    }

    #[must_use]
    pub fn stall_timeout(&self) -> Duration {
        Duration::from_secs(self.upload.stall_timeout_secs)
    }
}
