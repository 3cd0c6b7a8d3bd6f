#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Content digests for refcheck
//!
//! Every digest in the system is produced here, by the same streaming
//! routine, whether it describes a reference file or a staged upload.
//! A [`Hash`] remembers the algorithm that produced it, and two hashes
//! made with different algorithms never compare equal.

use refcheck_errors::{ConfigError, Error, IndexError};
use serde::{Deserialize, Serialize};
use sha2::Digest as _;
use std::fmt;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt};


/// Size of chunks for streaming hash computation
const CHUNK_SIZE: usize = 64 * 1024; // 64KB

/// Length in bytes of every supported digest
pub const DIGEST_LEN: usize = 32;

/// Hash algorithm used to build an index
///
/// Both supported algorithms are collision resistant and produce 32-byte
/// digests. An index is built with exactly one of them; switching requires a
/// full rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Blake3,
}

impl HashAlgorithm {
    /// Lowercase identifier used in config files and logs
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Blake3 => "blake3",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HashAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "blake3" => Ok(Self::Blake3),
            _ => Err(ConfigError::InvalidValue {
                field: "algorithm".to_string(),
                value: s.to_string(),
            }
            .into()),
        }
    }
}

/// Incremental hasher for one of the supported algorithms
pub struct Hasher {
    inner: HasherInner,
}

enum HasherInner {
    Sha256(sha2::Sha256),
    Blake3(Box<blake3::Hasher>),
}

impl Hasher {
    #[must_use]
    pub fn new(algorithm: HashAlgorithm) -> Self {
        let inner = match algorithm {
            HashAlgorithm::Sha256 => HasherInner::Sha256(sha2::Sha256::new()),
            HashAlgorithm::Blake3 => HasherInner::Blake3(Box::new(blake3::Hasher::new())),
        };
        Self { inner }
    }

    pub fn update(&mut self, data: &[u8]) {
        match &mut self.inner {
            HasherInner::Sha256(h) => h.update(data),
            HasherInner::Blake3(h) => {
                h.update(data);
            }
        }
    }

    #[must_use]
    pub fn finalize(self) -> Hash {
        match self.inner {
            HasherInner::Sha256(h) => {
                let mut bytes = [0u8; DIGEST_LEN];
                bytes.copy_from_slice(&h.finalize());
                Hash::from_bytes(HashAlgorithm::Sha256, bytes)
            }
            HasherInner::Blake3(h) => {
                Hash::from_bytes(HashAlgorithm::Blake3, *h.finalize().as_bytes())
            }
        }
    }
}

/// A content digest tagged with the algorithm that produced it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hash {
    algorithm: HashAlgorithm,
    bytes: [u8; DIGEST_LEN],
}

impl Hash {
    /// Create a hash from raw bytes
    #[must_use]
    pub fn from_bytes(algorithm: HashAlgorithm, bytes: [u8; DIGEST_LEN]) -> Self {
        Self { algorithm, bytes }
    }

    /// Algorithm this digest was computed with
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Get the raw bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.bytes
    }

    /// Convert to lowercase hex string
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Parse from hex string
    ///
    /// The algorithm cannot be recovered from the digest itself, so the caller
    /// states which one the hex was produced with.
    ///
    /// # Errors
    /// Returns an error if the input is not valid hexadecimal or is not exactly
    /// 64 characters (32 bytes).
    pub fn from_hex(s: &str, algorithm: HashAlgorithm) -> Result<Self, Error> {
        let bytes = hex::decode(s).map_err(|e| IndexError::InvalidSnapshot {
            message: format!("invalid hex digest: {e}"),
        })?;

        let array: [u8; DIGEST_LEN] =
            bytes
                .try_into()
                .map_err(|bytes: Vec<u8>| IndexError::InvalidSnapshot {
                    message: format!("digest must be {DIGEST_LEN} bytes, got {}", bytes.len()),
                })?;

        Ok(Self::from_bytes(algorithm, array))
    }

    /// Compute hash of a byte slice
    #[must_use]
    pub fn from_data(data: &[u8], algorithm: HashAlgorithm) -> Self {
        let mut hasher = Hasher::new(algorithm);
        hasher.update(data);
        hasher.finalize()
    }

    /// Compute hash of the full contents of a file
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or read.
    pub async fn hash_file(path: &Path, algorithm: HashAlgorithm) -> Result<Self, Error> {
        let (hash, _) = Self::hash_file_with_len(path, algorithm).await?;
        Ok(hash)
    }

    /// Compute hash of a file along with the number of bytes read
    ///
    /// Read failures carry `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or read.
    pub async fn hash_file_with_len(
        path: &Path,
        algorithm: HashAlgorithm,
    ) -> Result<(Self, u64), Error> {
        let file = File::open(path)
            .await
            .map_err(|e| Error::io_with_path(&e, path))?;

        Self::hash_reader(file, algorithm)
            .await
            .map_err(|e| match e {
                Error::Io { kind, message, .. } => Error::Io {
                    kind,
                    message,
                    path: Some(path.to_path_buf()),
                },
                other => other,
            })
    }

    /// Compute hash of everything a reader yields, returning the byte count too
    ///
    /// # Errors
    /// Returns an error if reading fails.
    pub async fn hash_reader<R>(mut reader: R, algorithm: HashAlgorithm) -> Result<(Self, u64), Error>
    where
        R: AsyncRead + Unpin,
    {
        let mut hasher = Hasher::new(algorithm);
        let mut buffer = vec![0; CHUNK_SIZE];
        let mut total_bytes = 0u64;

        loop {
            let n = reader.read(&mut buffer).await?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
            total_bytes += n as u64;
        }

        Ok((hasher.finalize(), total_bytes))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Hash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Verify a file matches an expected hash, using the expected hash's algorithm
///
/// # Errors
/// Returns an error if the file cannot be read or hashed.
pub async fn verify_file(path: &Path, expected: &Hash) -> Result<bool, Error> {
    let actual = Hash::hash_file(path, expected.algorithm()).await?;
    Ok(actual == *expected)
}
