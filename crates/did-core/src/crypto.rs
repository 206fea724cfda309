//! Signing, verification, encryption and decryption with key pairs.
//!
//! ECDSA signs a SHA-256 digest of the message and emits the fixed-width big-endian `r || s`
//! encoding (64 bytes). RSA uses PKCS#1 v1.5 over SHA-256 for signatures and OAEP with SHA-256
//! for encryption. SM2 runs in compatibility mode: it signs exactly like ECDSA on its P-256 key.
//!
//! Asymmetric encryption is only available for RSA. For ECDSA and SM2, `encrypt` and `decrypt`
//! pass data through unchanged and log a warning.

use ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use rand::rngs::OsRng;
use rand::RngCore;
use rsa::{Oaep, Pkcs1v15Sign};
use sha2::{Digest, Sha256};

use crate::error::Err;
use crate::keys::keypair::{PrivateKey, PublicKey};
use crate::{tracerr, Algorithm, KeyPair, Result};

const ECDSA_SIGNATURE_LEN: usize = 64;

/// Sign `data` with the key pair's private key.
///
/// # Returns
///
/// The hex-encoded signature.
///
/// # Errors
///
/// * `Err::InvalidInput` - `data` is empty.
/// * `Err::InvalidKey` - The key pair does not hold a key for `algorithm`.
/// * `Err::SigningError` - The signing primitive failed.
pub fn sign(key_pair: &KeyPair, data: &[u8], algorithm: Algorithm) -> Result<String> {
    if data.is_empty() {
        tracerr!(Err::InvalidInput, "data to sign cannot be empty");
    }
    let digest = Sha256::digest(data);

    let signature = match (algorithm, key_pair.private_key()) {
        (Algorithm::Ecdsa, PrivateKey::Secp256k1(secret)) => {
            let signing_key = k256::ecdsa::SigningKey::from(secret);
            let signature: k256::ecdsa::Signature = match signing_key.sign_prehash(&digest) {
                Ok(signature) => signature,
                Err(e) => tracerr!(Err::SigningError, "ECDSA signing failed: {e}"),
            };
            signature.to_bytes().to_vec()
        }
        (Algorithm::Sm2, PrivateKey::P256(secret)) => {
            let signing_key = p256::ecdsa::SigningKey::from(secret);
            let signature: p256::ecdsa::Signature = match signing_key.sign_prehash(&digest) {
                Ok(signature) => signature,
                Err(e) => tracerr!(Err::SigningError, "SM2 signing failed: {e}"),
            };
            signature.to_bytes().to_vec()
        }
        (Algorithm::Rsa, PrivateKey::Rsa(secret)) => {
            match secret.sign(Pkcs1v15Sign::new::<Sha256>(), &digest) {
                Ok(signature) => signature,
                Err(e) => tracerr!(Err::SigningError, "RSA signing failed: {e}"),
            }
        }
        (algorithm, private_key) => tracerr!(
            Err::InvalidKey,
            "{} key cannot sign with {algorithm}",
            private_key.algorithm()
        ),
    };

    tracing::debug!("signed {} bytes with {algorithm}", data.len());
    Ok(hex::encode(signature))
}

/// Verify a signature over `data`.
///
/// # Returns
///
/// `true` if the signature is valid, `false` if it does not match.
///
/// # Errors
///
/// * `Err::InvalidInput` - `data` or `signature` is empty.
/// * `Err::InvalidKey` - The public key is not a key for `algorithm`.
/// * `Err::InvalidSignatureFormat` - An ECDSA or SM2 signature is shorter than 64 bytes or its
///   scalars are out of range.
pub fn verify(
    public_key: &PublicKey, data: &[u8], signature: &[u8], algorithm: Algorithm,
) -> Result<bool> {
    if data.is_empty() {
        tracerr!(Err::InvalidInput, "data to verify cannot be empty");
    }
    if signature.is_empty() {
        tracerr!(Err::InvalidInput, "signature cannot be empty");
    }
    let digest = Sha256::digest(data);

    let valid = match (algorithm, public_key) {
        (Algorithm::Ecdsa, PublicKey::Secp256k1(public)) => {
            let signature = k256::ecdsa::Signature::from_slice(ecdsa_components(signature)?);
            let Ok(signature) = signature else {
                tracerr!(Err::InvalidSignatureFormat, "ECDSA signature scalars out of range");
            };
            // k256 only accepts low-S; other signers emit either form
            let signature = signature.normalize_s().unwrap_or(signature);
            let verifying_key = k256::ecdsa::VerifyingKey::from(public);
            verifying_key.verify_prehash(&digest, &signature).is_ok()
        }
        (Algorithm::Sm2, PublicKey::P256(public)) => {
            let signature = p256::ecdsa::Signature::from_slice(ecdsa_components(signature)?);
            let Ok(signature) = signature else {
                tracerr!(Err::InvalidSignatureFormat, "SM2 signature scalars out of range");
            };
            let verifying_key = p256::ecdsa::VerifyingKey::from(public);
            verifying_key.verify_prehash(&digest, &signature).is_ok()
        }
        (Algorithm::Rsa, PublicKey::Rsa(public)) => {
            public.verify(Pkcs1v15Sign::new::<Sha256>(), &digest, signature).is_ok()
        }
        (algorithm, public_key) => tracerr!(
            Err::InvalidKey,
            "{} key cannot verify {algorithm} signatures",
            public_key.algorithm()
        ),
    };

    Ok(valid)
}

/// Verify a hex-encoded signature over `data`.
///
/// # Errors
///
/// As for [`verify`], plus `Err::InvalidInput` if `signature` is not valid hex.
pub fn verify_hex(
    public_key: &PublicKey, data: &[u8], signature: &str, algorithm: Algorithm,
) -> Result<bool> {
    let signature = match hex::decode(signature) {
        Ok(signature) => signature,
        Err(e) => tracerr!(Err::InvalidInput, "invalid signature hex: {e}"),
    };
    verify(public_key, data, &signature, algorithm)
}

/// Encrypt `plaintext` for the public key.
///
/// ECDSA and SM2 do not support encryption; the plaintext is returned unmodified.
///
/// # Returns
///
/// The hex-encoded ciphertext.
///
/// # Errors
///
/// * `Err::InvalidInput` - `plaintext` is empty.
/// * `Err::InvalidKey` - The public key is not a key for `algorithm`.
/// * `Err::EncryptionError` - The RSA primitive failed (eg. the message is too long).
pub fn encrypt(public_key: &PublicKey, plaintext: &[u8], algorithm: Algorithm) -> Result<String> {
    if plaintext.is_empty() {
        tracerr!(Err::InvalidInput, "plaintext cannot be empty");
    }

    let ciphertext = match (algorithm, public_key) {
        (Algorithm::Rsa, PublicKey::Rsa(public)) => {
            match public.encrypt(&mut OsRng, Oaep::new::<Sha256>(), plaintext) {
                Ok(ciphertext) => ciphertext,
                Err(e) => tracerr!(Err::EncryptionError, "RSA encryption failed: {e}"),
            }
        }
        (Algorithm::Ecdsa, PublicKey::Secp256k1(_)) | (Algorithm::Sm2, PublicKey::P256(_)) => {
            // the session key is drawn but never applied
            let mut session_key = [0u8; 32];
            OsRng.fill_bytes(&mut session_key);
            tracing::warn!("{algorithm} encryption is a passthrough, data is not encrypted");
            plaintext.to_vec()
        }
        (algorithm, public_key) => tracerr!(
            Err::InvalidKey,
            "{} key cannot encrypt with {algorithm}",
            public_key.algorithm()
        ),
    };

    Ok(hex::encode(ciphertext))
}

/// Decrypt `ciphertext` with the key pair's private key.
///
/// # Errors
///
/// * `Err::InvalidInput` - `ciphertext` is empty.
/// * `Err::InvalidKey` - The key pair does not hold a key for `algorithm`.
/// * `Err::EncryptionError` - The RSA primitive failed (eg. wrong key or corrupted data).
pub fn decrypt(key_pair: &KeyPair, ciphertext: &[u8], algorithm: Algorithm) -> Result<Vec<u8>> {
    if ciphertext.is_empty() {
        tracerr!(Err::InvalidInput, "ciphertext cannot be empty");
    }

    match (algorithm, key_pair.private_key()) {
        (Algorithm::Rsa, PrivateKey::Rsa(secret)) => {
            match secret.decrypt(Oaep::new::<Sha256>(), ciphertext) {
                Ok(plaintext) => Ok(plaintext),
                Err(e) => tracerr!(Err::EncryptionError, "RSA decryption failed: {e}"),
            }
        }
        (Algorithm::Ecdsa, PrivateKey::Secp256k1(_)) | (Algorithm::Sm2, PrivateKey::P256(_)) => {
            tracing::warn!("{algorithm} decryption is a passthrough, data is not decrypted");
            Ok(ciphertext.to_vec())
        }
        (algorithm, private_key) => tracerr!(
            Err::InvalidKey,
            "{} key cannot decrypt with {algorithm}",
            private_key.algorithm()
        ),
    }
}

// Leading `r || s` of an ECDSA signature. Anything past 64 bytes is ignored.
fn ecdsa_components(signature: &[u8]) -> Result<&[u8]> {
    if signature.len() < ECDSA_SIGNATURE_LEN {
        tracerr!(
            Err::InvalidSignatureFormat,
            "signature must be at least {ECDSA_SIGNATURE_LEN} bytes, got {}",
            signature.len()
        );
    }
    Ok(&signature[..ECDSA_SIGNATURE_LEN])
}
