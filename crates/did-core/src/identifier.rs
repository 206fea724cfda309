//! Decentralized identifier derivation and validation.
//!
//! Identifiers have the form `did:<method>:<hex-sha256-of-public-key-bytes>`.

use crate::error::Err;
use crate::hashing::{compute_hash, HashAlgorithm};
use crate::keys::keypair::PublicKeySource;
use crate::{tracerr, Result};

/// Scheme prefix every identifier starts with.
pub const DID_PREFIX: &str = "did:";

/// Derive an identifier by hashing the public key bytes with SHA-256 and appending the hex digest
/// to `method_prefix`.
///
/// The prefix's trailing colon is optional: `did:sbp` and `did:sbp:` both give
/// `did:sbp:<hex>`.
///
/// # Arguments
///
/// * `public_key` - A key pair, public key bytes, or a hex string of the bytes.
/// * `method_prefix` - `did:` followed by the method name (eg. `did:sbp:`).
///
/// # Errors
///
/// * `Err::InvalidInput` - The prefix is empty, lacks `did:`, or has an empty method segment; or
///   the public key is empty or not valid hex.
pub fn derive_identifier<'a>(
    public_key: impl Into<PublicKeySource<'a>>, method_prefix: &str,
) -> Result<String> {
    if method_prefix.is_empty() {
        tracerr!(Err::InvalidInput, "method prefix cannot be empty");
    }
    let Some(method) = method_prefix.strip_prefix(DID_PREFIX) else {
        tracerr!(
            Err::InvalidInput,
            "method prefix must start with '{DID_PREFIX}': {method_prefix}"
        );
    };
    let method = method.strip_suffix(':').unwrap_or(method);
    if method.is_empty() || method.split(':').any(str::is_empty) {
        tracerr!(Err::InvalidInput, "method prefix has an empty method segment: {method_prefix}");
    }

    let bytes = public_key.into().to_bytes()?;
    let digest = compute_hash(&bytes, HashAlgorithm::Sha256)?;
    Ok(format!("{DID_PREFIX}{method}:{digest}"))
}

/// Check that `id` is a well-formed identifier: it starts with `did:` and has non-empty method
/// and identifier segments.
///
/// # Errors
///
/// * `Err::InvalidInput` - The identifier is malformed.
pub fn validate_identifier(id: &str) -> Result<()> {
    segments(id).map(|_| ())
}

/// The method segment of an identifier (`sbp` in `did:sbp:abc`).
///
/// # Errors
///
/// * `Err::InvalidInput` - The identifier is malformed.
pub fn extract_method(id: &str) -> Result<&str> {
    segments(id).map(|(method, _)| method)
}

/// The method-specific identifier segment (`abc` in `did:sbp:abc`).
///
/// # Errors
///
/// * `Err::InvalidInput` - The identifier is malformed.
pub fn extract_identifier_part(id: &str) -> Result<&str> {
    segments(id).map(|(_, part)| part)
}

fn segments(id: &str) -> Result<(&str, &str)> {
    if id.is_empty() {
        tracerr!(Err::InvalidInput, "identifier cannot be empty");
    }
    if !id.starts_with(DID_PREFIX) {
        tracerr!(Err::InvalidInput, "identifier must start with '{DID_PREFIX}': {id}");
    }

    let mut parts = id.split(':').skip(1);
    let (Some(method), Some(part)) = (parts.next(), parts.next()) else {
        tracerr!(Err::InvalidInput, "identifier must have at least 3 segments: {id}");
    };
    if method.is_empty() {
        tracerr!(Err::InvalidInput, "identifier method cannot be empty: {id}");
    }
    if part.is_empty() {
        tracerr!(Err::InvalidInput, "method-specific identifier cannot be empty: {id}");
    }
    Ok((method, part))
}

#[cfg(test)]
mod tests {
    use regex::Regex;

    use super::*;
    use crate::{Algorithm, KeyPair};

    #[test]
    fn derive_from_key_pair() {
        let key_pair = KeyPair::generate(Algorithm::Ecdsa, "demo").expect("should generate");
        let did = derive_identifier(&key_pair, "did:sbp:").expect("should derive");

        let re = Regex::new("^did:sbp:[0-9a-f]{64}$").expect("valid regex");
        assert!(re.is_match(&did));
        validate_identifier(&did).expect("derived identifier should be valid");
    }

    #[test]
    fn derivation_is_pure() {
        let key_pair = KeyPair::generate(Algorithm::Sm2, "demo").expect("should generate");
        let bytes = key_pair.public_key_bytes().expect("should encode");
        let hex_key = hex::encode(&bytes);

        let a = derive_identifier(&key_pair, "did:sbp:").expect("should derive");
        let b = derive_identifier(&bytes, "did:sbp:").expect("should derive");
        let c = derive_identifier(hex_key.as_str(), "did:sbp").expect("should derive");
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn known_digest() {
        let did = derive_identifier("616263", "did:example:").expect("should derive");
        assert_eq!(
            did,
            "did:example:ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn bad_prefix() {
        for prefix in ["", "sbp:", "did:", "did::", "did:a::"] {
            let err = derive_identifier("616263", prefix).expect_err("should fail");
            assert!(err.is(Err::InvalidInput), "prefix {prefix:?}");
        }
    }

    #[test]
    fn empty_key() {
        let err = derive_identifier("", "did:sbp:").expect_err("should fail");
        assert!(err.is(Err::InvalidInput));
    }

    #[test]
    fn validation() {
        validate_identifier("did:sbp:abc").expect("should be valid");
        validate_identifier("did:web:example.com:users:alice").expect("should be valid");

        for id in ["", "not-a-did", "did:", "did::", "did:sbp", "did:sbp:", "did::abc"] {
            let err = validate_identifier(id).expect_err("should fail");
            assert!(err.is(Err::InvalidInput), "id {id:?}");
        }
    }

    #[test]
    fn extraction() {
        assert_eq!(extract_method("did:sbp:abc").expect("method"), "sbp");
        assert_eq!(extract_identifier_part("did:sbp:abc").expect("part"), "abc");
        assert!(extract_method("did::").expect_err("invalid").is(Err::InvalidInput));
    }
}
