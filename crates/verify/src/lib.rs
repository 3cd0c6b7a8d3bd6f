#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Upload verification for refcheck
//!
//! An upload is accepted only when its bytes hash to the digest the content
//! index holds for its claimed name. Inbound bytes are staged first and are
//! either promoted into the accepted directory or deleted; nothing else is
//! left behind, including when the verification future is dropped.

mod name;
mod staging;
mod verifier;

pub use name::{sanitize_name, MAX_NAME_LEN};
pub use staging::StagedUpload;
pub use verifier::{verify_with_index, AcceptedUpload, UploadVerifier, Verdict, VerifierOptions};
