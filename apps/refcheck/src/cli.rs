//! Command line interface definition

use clap::{Parser, Subcommand};
use refcheck_hash::HashAlgorithm;
use refcheck_types::IndexErrorPolicy;
use std::path::PathBuf;

/// refcheck - content index and upload integrity verifier
#[derive(Parser)]
#[command(name = "refcheck")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Index reference files by content hash and verify uploaded copies")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable structured debug logging on stderr
    #[arg(long, global = true)]
    pub debug: bool,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory holding the reference files
    #[arg(long, global = true, value_name = "DIR")]
    pub reference_dir: Option<PathBuf>,

    /// Directory uploads are staged in before verification
    #[arg(long, global = true, value_name = "DIR")]
    pub staging_dir: Option<PathBuf>,

    /// Directory accepted uploads are moved to
    #[arg(long, global = true, value_name = "DIR")]
    pub accepted_dir: Option<PathBuf>,

    /// Digest algorithm (sha256 or blake3)
    #[arg(long, global = true, value_name = "ALGORITHM")]
    pub algorithm: Option<HashAlgorithm>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Hash every file in the reference directory
    Index {
        /// Write the index as JSON to this file
        #[arg(long, value_name = "PATH")]
        export: Option<PathBuf>,

        /// What to do with files that cannot be read
        #[arg(long, value_enum)]
        on_error: Option<IndexErrorPolicy>,
    },

    /// List the indexed reference files and their digests
    #[command(alias = "ls")]
    List {
        /// Read the configured index cache instead of re-hashing
        #[arg(long)]
        cached: bool,
    },

    /// Verify local files as if they had been uploaded
    Verify {
        /// Files to verify
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Claim this name instead of each file's own name
        #[arg(long, value_name = "NAME")]
        name: Option<String>,
    },
}
