//! Helper functions for hashing data with SHA-256 or SM3.

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sm3::Sm3;

use crate::error::{Context, Err, Error};
use crate::{tracerr, Result};

/// Hash algorithms supported by the SDK.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum HashAlgorithm {
    /// SHA-256.
    #[default]
    #[serde(rename = "SHA256")]
    Sha256,
    /// SM3 (GB/T 32905-2016).
    #[serde(rename = "SM3")]
    Sm3,
}

impl Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sha256 => write!(f, "SHA256"),
            Self::Sm3 => write!(f, "SM3"),
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "" => tracerr!(Err::InvalidInput, "hash algorithm cannot be empty"),
            "SHA256" => Ok(Self::Sha256),
            "SM3" => Ok(Self::Sm3),
            _ => tracerr!(Err::UnsupportedAlgorithm, "unsupported hash algorithm: {s}"),
        }
    }
}

/// Computes the digest of `data` and returns it hex-encoded (lower case).
///
/// # Arguments
///
/// * `data` - The data to hash.
/// * `algorithm` - The hash algorithm to use.
///
/// # Errors
///
/// * `Err::InvalidInput` - `data` is empty.
pub fn compute_hash(data: &[u8], algorithm: HashAlgorithm) -> Result<String> {
    if data.is_empty() {
        tracerr!(Err::InvalidInput, "data to hash cannot be empty");
    }
    Ok(hex::encode(digest(data, algorithm)))
}

/// Decodes hex-encoded input and hashes the resulting bytes.
///
/// # Errors
///
/// * `Err::InvalidInput` - `hex_data` is empty or is not valid hex.
pub fn compute_hash_hex(hex_data: &str, algorithm: HashAlgorithm) -> Result<String> {
    let data = hex::decode(hex_data).context(Err::InvalidInput)?;
    compute_hash(&data, algorithm)
}

/// Raw digest of `data`.
#[must_use]
pub fn digest(data: &[u8], algorithm: HashAlgorithm) -> Vec<u8> {
    match algorithm {
        HashAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
        HashAlgorithm::Sm3 => Sm3::digest(data).to_vec(),
    }
}
