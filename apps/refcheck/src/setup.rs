//! Wiring of configuration into the index and verifier

use refcheck_config::Config;
use refcheck_errors::{ConfigError, Error};
use refcheck_events::EventSender;
use refcheck_index::{ContentIndex, IndexBuilder, IndexCache, IndexOptions, IndexReport, SharedIndex};
use refcheck_verify::{UploadVerifier, VerifierOptions};
use std::sync::Arc;
use tracing::info;

/// Engine components built from one configuration
pub struct Engine {
    config: Config,
    builder: IndexBuilder,
    tx: EventSender,
}

impl Engine {
    pub fn new(config: Config, tx: EventSender) -> Self {
        let builder = IndexBuilder::new(IndexOptions {
            algorithm: config.index.algorithm,
            on_error: config.index.on_error,
            max_concurrency: config.index.max_concurrency,
        })
        .with_event_sender(tx.clone());

        Self {
            config,
            builder,
            tx,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Hash the reference directory
    pub async fn build_index(&self) -> Result<IndexReport, Error> {
        self.builder.build(&self.config.reference_dir()).await
    }

    /// Read the configured index cache
    pub async fn cached_index(&self) -> Result<ContentIndex, Error> {
        let path = self.config.index_cache().ok_or_else(|| ConfigError::Invalid {
            message: "no index_cache is configured under [paths]".to_string(),
        })?;

        IndexCache::new(path)
            .load(self.config.index.algorithm, &self.config.reference_dir())
            .await
    }

    /// Write an index to `path` in the export format
    pub async fn export_index(&self, index: &ContentIndex, path: &std::path::Path) -> Result<(), Error> {
        IndexCache::new(path).save(index).await?;
        info!(path = %path.display(), entries = index.len(), "index exported");
        Ok(())
    }

    /// Build the index and a verifier over it, creating upload directories
    ///
    /// An index that cannot be built makes verification impossible and is
    /// returned as an error.
    pub async fn verifier(&self) -> Result<UploadVerifier, Error> {
        let report = self.build_index().await?;
        let shared = SharedIndex::new(Arc::clone(&report.index));

        let verifier = UploadVerifier::new(shared, VerifierOptions::from(&self.config))
            .with_event_sender(self.tx.clone());
        verifier.prepare().await?;
        Ok(verifier)
    }
}
