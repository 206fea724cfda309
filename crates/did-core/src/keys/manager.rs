//! Key-manager capability traits.
//!
//! A key manager holds private key material and hands out opaque key identifiers. Callers never
//! see private keys unless they explicitly export them (and the backend allows it).
//!
//! Key lifecycle and key use are separate capabilities: [`KeyManager`] creates, imports, exports,
//! deletes and lists keys, while [`Crypto`] signs, verifies, encrypts and decrypts with them. A
//! backend may implement either or both.

use base64ct::{Base64UrlUnpadded, Encoding};
use k256::pkcs8::DecodePublicKey;
use rsa::RsaPublicKey;

use super::{Jwk, KeyType};
use crate::document::verification_method::VerificationMethod;
use crate::error::Err;
use crate::{tracerr, Result};

/// Key lifecycle operations. Public keys are exchanged as SPKI DER bytes.
#[allow(async_fn_in_trait)]
pub trait KeyManager {
    /// Create a key of the given type.
    ///
    /// # Returns
    ///
    /// The new key's identifier and its public key bytes.
    async fn create(&self, key_type: KeyType) -> Result<(String, Vec<u8>)>;

    /// Get the public key bytes for a key.
    ///
    /// # Errors
    ///
    /// * `Err::KeyNotFound` - There is no key with the identifier.
    async fn get(&self, key_id: &str) -> Result<Vec<u8>>;

    /// Import private key material, returning the identifier it is stored under.
    async fn import_private_key(&self, private_key: &[u8], key_type: KeyType) -> Result<String>;

    /// Export private key material.
    ///
    /// # Errors
    ///
    /// * `Err::KeyNotFound` - There is no key with the identifier.
    /// * `Err::UnsupportedOperation` - The backend does not release private keys.
    async fn export_private_key(&self, key_id: &str) -> Result<Vec<u8>>;

    /// Delete a key.
    ///
    /// # Errors
    ///
    /// * `Err::KeyNotFound` - There is no key with the identifier.
    async fn delete(&self, key_id: &str) -> Result<()>;

    /// Identifiers of every key held.
    async fn list(&self) -> Result<Vec<String>>;

    /// Key type of a held key.
    ///
    /// # Errors
    ///
    /// * `Err::KeyNotFound` - There is no key with the identifier.
    async fn key_type(&self, key_id: &str) -> Result<KeyType>;
}

/// Cryptographic operations on keys held by a key manager.
#[allow(async_fn_in_trait)]
pub trait Crypto {
    /// Sign `data` with the key.
    async fn sign(&self, key_id: &str, data: &[u8]) -> Result<Vec<u8>>;

    /// Verify a signature over `data`. A signature that does not match returns `Ok(false)`.
    async fn verify(&self, key_id: &str, data: &[u8], signature: &[u8]) -> Result<bool>;

    /// Encrypt `plaintext` for the key.
    async fn encrypt(&self, key_id: &str, plaintext: &[u8]) -> Result<Vec<u8>>;

    /// Decrypt `ciphertext` with the key.
    async fn decrypt(&self, key_id: &str, ciphertext: &[u8]) -> Result<Vec<u8>>;
}

/// Build a verification method for a key held by a key manager. The method ID is
/// `<did>#<key_id>`, the public key is carried as base58 and as a JWK.
///
/// # Errors
///
/// * `Err::KeyNotFound` - The manager has no key with the identifier.
/// * `Err::InvalidKey` - The manager returned a public key that cannot be parsed.
pub async fn verification_method_from_manager(
    did: &str, key_id: &str, manager: &impl KeyManager,
) -> Result<VerificationMethod> {
    crate::identifier::validate_identifier(did)?;

    let key_type = manager.key_type(key_id).await?;
    let public_key = manager.get(key_id).await?;
    let jwk = spki_to_jwk(&public_key, key_type)?;

    Ok(VerificationMethod {
        id: format!("{did}#{key_id}"),
        type_: verification_method_type(key_type).to_string(),
        controller: did.to_string(),
        public_key_base58: Some(bs58::encode(&public_key).into_string()),
        public_key_jwk: Some(jwk),
        ..VerificationMethod::default()
    })
}

const fn verification_method_type(key_type: KeyType) -> &'static str {
    match key_type {
        KeyType::Ed25519 => "Ed25519VerificationKey2020",
        KeyType::EcdsaP256 => "EcdsaSecp256r1VerificationKey2019",
        KeyType::Rsa2048 => "RsaVerificationKey2018",
        KeyType::Sm2 => "EcdsaSecp256k1VerificationKey2019",
    }
}

/// Convert SPKI DER public key bytes to a JWK.
///
/// # Errors
///
/// * `Err::InvalidKey` - The bytes are not a valid SPKI public key of the given type.
pub fn spki_to_jwk(der: &[u8], key_type: KeyType) -> Result<Jwk> {
    match key_type {
        KeyType::EcdsaP256 | KeyType::Sm2 => match p256::PublicKey::from_public_key_der(der) {
            Ok(public) => Jwk::from_ec_json(&public.to_jwk_string()),
            Err(e) => tracerr!(Err::InvalidKey, "invalid P-256 public key: {e}"),
        },
        KeyType::Rsa2048 => match RsaPublicKey::from_public_key_der(der) {
            Ok(public) => crate::PublicKey::Rsa(public).to_jwk(),
            Err(e) => tracerr!(Err::InvalidKey, "invalid RSA public key: {e}"),
        },
        KeyType::Ed25519 => {
            // SPKI for Ed25519 is a fixed 12-byte header followed by the 32-byte key
            let Some(raw) = der.strip_prefix(&ED25519_SPKI_PREFIX[..]) else {
                tracerr!(Err::InvalidKey, "invalid Ed25519 public key");
            };
            if raw.len() != 32 {
                tracerr!(Err::InvalidKey, "invalid Ed25519 public key length: {}", raw.len());
            }
            Ok(Jwk {
                kty: "OKP".to_string(),
                crv: Some("Ed25519".to_string()),
                x: Some(Base64UrlUnpadded::encode_string(raw)),
                ..Jwk::default()
            })
        }
    }
}

const ED25519_SPKI_PREFIX: [u8; 12] =
    [0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x03, 0x21, 0x00];

#[cfg(test)]
mod tests {
    use k256::pkcs8::EncodePublicKey;

    use super::*;

    #[test]
    fn p256_spki_jwk() {
        let secret = p256::SecretKey::random(&mut rand::rngs::OsRng);
        let der = secret.public_key().to_public_key_der().expect("should encode");
        let jwk = spki_to_jwk(der.as_bytes(), KeyType::EcdsaP256).expect("should convert");
        assert_eq!(jwk.kty, "EC");
        assert_eq!(jwk.crv.as_deref(), Some("P-256"));
    }

    #[test]
    fn ed25519_spki_jwk() {
        let mut der = ED25519_SPKI_PREFIX.to_vec();
        der.extend_from_slice(&[7u8; 32]);
        let jwk = spki_to_jwk(&der, KeyType::Ed25519).expect("should convert");
        assert_eq!(jwk.kty, "OKP");
        assert_eq!(jwk.x.as_deref(), Some("BwcHBwcHBwcHBwcHBwcHBwcHBwcHBwcHBwcHBwcHBwc"));

        let err = spki_to_jwk(&der[..20], KeyType::Ed25519).expect_err("short key");
        assert!(err.is(Err::InvalidKey));
    }
}
