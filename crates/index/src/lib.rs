#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Content index for refcheck
//!
//! Builds the name → digest map of a reference directory, shares it between
//! concurrent verifiers, and saves it as a JSON export.

mod builder;
mod cache;
mod handle;
mod models;

pub use builder::{
    IndexBuilder, IndexOptions, IndexReport, ShadowedEntry, SkippedEntry, DEFAULT_MAX_CONCURRENCY,
};
pub use cache::IndexCache;
pub use handle::SharedIndex;
pub use models::{ContentIndex, ReferenceEntry};
