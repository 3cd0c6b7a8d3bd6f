//! Default locations and limits
//!
//! Relative paths resolve against the working directory of the process,
//! which is how the service has always been deployed.

/// Reference files offered for download
pub const DEFAULT_REFERENCE_DIR: &str = "./static/downloads";

/// Final home of accepted uploads
pub const DEFAULT_ACCEPTED_DIR: &str = "./uploads";

/// In-flight uploads. Kept under the accepted directory so promotion is a
/// same-filesystem rename.
pub const DEFAULT_STAGING_DIR: &str = "./uploads/.staging";

/// 350 MiB
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 350 * 1024 * 1024;

pub const DEFAULT_STALL_TIMEOUT_SECS: u64 = 60;

pub const DEFAULT_INDEX_CONCURRENCY: usize = 4;
