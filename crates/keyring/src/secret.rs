//! Private key material held by the local key manager, one variant per key type.

use did_core::error::Err;
use did_core::{tracerr, KeyType, Result};
use ed25519_dalek::pkcs8::{DecodePrivateKey, EncodePrivateKey};
use ed25519_dalek::{Signer as _, Verifier as _};
use p256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use p256::pkcs8::EncodePublicKey;
use rand::rngs::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, Pkcs1v15Sign, RsaPrivateKey};
use sha2::{Digest, Sha256};

const RSA_BITS: usize = 2048;

/// A private key and the type it was created or imported as.
#[derive(Clone)]
pub(crate) enum SecretKey {
    Ed25519(ed25519_dalek::SigningKey),
    // SM2 keys live on P-256 in compatibility mode
    P256(KeyType, p256::SecretKey),
    Rsa(Box<RsaPrivateKey>),
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let variant = match self {
            Self::Ed25519(_) => "Ed25519",
            Self::P256(..) => "P256",
            Self::Rsa(_) => "Rsa",
        };
        write!(f, "SecretKey::{variant}(..)")
    }
}

impl SecretKey {
    /// Generate a new key of the given type.
    pub(crate) fn generate(key_type: KeyType) -> Result<Self> {
        let key = match key_type {
            KeyType::Ed25519 => Self::Ed25519(ed25519_dalek::SigningKey::generate(&mut OsRng)),
            KeyType::EcdsaP256 | KeyType::Sm2 => {
                Self::P256(key_type, p256::SecretKey::random(&mut OsRng))
            }
            KeyType::Rsa2048 => match RsaPrivateKey::new(&mut OsRng, RSA_BITS) {
                Ok(key) => Self::Rsa(Box::new(key)),
                Err(e) => tracerr!(Err::InvalidKey, "failed to generate RSA key: {e}"),
            },
        };
        Ok(key)
    }

    /// Parse private key bytes: PKCS#8 DER for Ed25519, SEC1 DER for P-256 and SM2, PKCS#1 DER
    /// for RSA.
    pub(crate) fn from_der(der: &[u8], key_type: KeyType) -> Result<Self> {
        if der.is_empty() {
            tracerr!(Err::InvalidInput, "private key cannot be empty");
        }
        let key = match key_type {
            KeyType::Ed25519 => match ed25519_dalek::SigningKey::from_pkcs8_der(der) {
                Ok(key) => Self::Ed25519(key),
                Err(e) => tracerr!(Err::InvalidKey, "invalid Ed25519 private key: {e}"),
            },
            KeyType::EcdsaP256 | KeyType::Sm2 => match p256::SecretKey::from_sec1_der(der) {
                Ok(key) => Self::P256(key_type, key),
                Err(e) => tracerr!(Err::InvalidKey, "invalid {key_type} private key: {e}"),
            },
            KeyType::Rsa2048 => {
                let key = match RsaPrivateKey::from_pkcs1_der(der) {
                    Ok(key) => key,
                    Err(e) => tracerr!(Err::InvalidKey, "invalid RSA private key: {e}"),
                };
                if key.size() * 8 != RSA_BITS {
                    tracerr!(Err::InvalidKey, "RSA key is {} bits, not {RSA_BITS}", key.size() * 8);
                }
                Self::Rsa(Box::new(key))
            }
        };
        Ok(key)
    }

    pub(crate) const fn key_type(&self) -> KeyType {
        match self {
            Self::Ed25519(_) => KeyType::Ed25519,
            Self::P256(key_type, _) => *key_type,
            Self::Rsa(_) => KeyType::Rsa2048,
        }
    }

    /// Private key bytes in the same format accepted by `from_der`.
    pub(crate) fn to_der(&self) -> Result<Vec<u8>> {
        match self {
            Self::Ed25519(key) => encoded(key.to_pkcs8_der().map(|doc| doc.as_bytes().to_vec())),
            Self::P256(_, key) => encoded(key.to_sec1_der().map(|der| der.to_vec())),
            Self::Rsa(key) => encoded(key.to_pkcs1_der().map(|doc| doc.as_bytes().to_vec())),
        }
    }

    /// Public key as SPKI DER.
    pub(crate) fn public_key_der(&self) -> Result<Vec<u8>> {
        let der = match self {
            Self::Ed25519(key) => key.verifying_key().to_public_key_der(),
            Self::P256(_, key) => key.public_key().to_public_key_der(),
            Self::Rsa(key) => key.to_public_key().to_public_key_der(),
        };
        encoded(der.map(|doc| doc.as_bytes().to_vec()))
    }

    /// Sign `data`. ECDSA signatures are DER encoded over the SHA-256 digest; Ed25519 signs the
    /// message itself; RSA uses PKCS#1 v1.5 over the SHA-256 digest.
    pub(crate) fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Ed25519(key) => Ok(key.sign(data).to_bytes().to_vec()),
            Self::P256(_, key) => {
                let signing_key = p256::ecdsa::SigningKey::from(key);
                let digest = Sha256::digest(data);
                let signature: p256::ecdsa::Signature = match signing_key.sign_prehash(&digest) {
                    Ok(sig) => sig,
                    Err(e) => tracerr!(Err::SigningError, "ECDSA signing failed: {e}"),
                };
                Ok(signature.to_der().as_bytes().to_vec())
            }
            Self::Rsa(key) => {
                let digest = Sha256::digest(data);
                match key.sign(Pkcs1v15Sign::new::<Sha256>(), &digest) {
                    Ok(sig) => Ok(sig),
                    Err(e) => tracerr!(Err::SigningError, "RSA signing failed: {e}"),
                }
            }
        }
    }

    /// Verify a signature made by `sign`. A signature that does not match returns `false`.
    pub(crate) fn verify(&self, data: &[u8], signature: &[u8]) -> Result<bool> {
        if signature.is_empty() {
            tracerr!(Err::InvalidInput, "signature cannot be empty");
        }
        match self {
            Self::Ed25519(key) => {
                let Ok(sig) = ed25519_dalek::Signature::from_slice(signature) else {
                    tracerr!(Err::InvalidSignatureFormat, "invalid Ed25519 signature");
                };
                Ok(key.verifying_key().verify(data, &sig).is_ok())
            }
            Self::P256(_, key) => {
                let Ok(sig) = p256::ecdsa::Signature::from_der(signature) else {
                    tracerr!(Err::InvalidSignatureFormat, "invalid DER ECDSA signature");
                };
                let verifying_key = p256::ecdsa::VerifyingKey::from(key.public_key());
                let digest = Sha256::digest(data);
                Ok(verifying_key.verify_prehash(&digest, &sig).is_ok())
            }
            Self::Rsa(key) => {
                let digest = Sha256::digest(data);
                let public = key.to_public_key();
                Ok(public.verify(Pkcs1v15Sign::new::<Sha256>(), &digest, signature).is_ok())
            }
        }
    }

    /// Encrypt with RSA-OAEP-SHA256. Other key types cannot encrypt.
    pub(crate) fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let Self::Rsa(key) = self else {
            tracerr!(Err::UnsupportedOperation, "{} keys cannot encrypt", self.key_type());
        };
        match key.to_public_key().encrypt(&mut OsRng, Oaep::new::<Sha256>(), plaintext) {
            Ok(ct) => Ok(ct),
            Err(e) => tracerr!(Err::EncryptionError, "RSA-OAEP encryption failed: {e}"),
        }
    }

    /// Decrypt RSA-OAEP-SHA256 ciphertext.
    pub(crate) fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        let Self::Rsa(key) = self else {
            tracerr!(Err::UnsupportedOperation, "{} keys cannot decrypt", self.key_type());
        };
        match key.decrypt(Oaep::new::<Sha256>(), ciphertext) {
            Ok(pt) => Ok(pt),
            Err(e) => tracerr!(Err::EncryptionError, "RSA-OAEP decryption failed: {e}"),
        }
    }
}

fn encoded<T, E: std::fmt::Display>(result: std::result::Result<T, E>) -> Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(e) => tracerr!(Err::EncodingError, "failed to encode key: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn private_key_round_trip() {
        for key_type in [KeyType::Ed25519, KeyType::EcdsaP256, KeyType::Sm2] {
            let key = SecretKey::generate(key_type).expect("should generate");
            let der = key.to_der().expect("should export");
            let imported = SecretKey::from_der(&der, key_type).expect("should import");
            assert_eq!(imported.key_type(), key_type);
            assert_eq!(
                imported.public_key_der().expect("public key"),
                key.public_key_der().expect("public key")
            );
        }
    }

    #[test]
    fn wrong_format() {
        let key = SecretKey::generate(KeyType::EcdsaP256).expect("should generate");
        let der = key.to_der().expect("should export");
        let err = SecretKey::from_der(&der, KeyType::Rsa2048).expect_err("not an RSA key");
        assert!(err.is(Err::InvalidKey));

        let err = SecretKey::from_der(&[], KeyType::Ed25519).expect_err("empty");
        assert!(err.is(Err::InvalidInput));
    }

    #[test]
    fn ecdsa_der_signature() {
        let key = SecretKey::generate(KeyType::EcdsaP256).expect("should generate");
        let sig = key.sign(b"hello").expect("should sign");
        assert_eq!(sig[0], 0x30);
        assert!(key.verify(b"hello", &sig).expect("should verify"));
        assert!(!key.verify(b"hellO", &sig).expect("should verify"));

        let err = key.verify(b"hello", &[1, 2, 3]).expect_err("not DER");
        assert!(err.is(Err::InvalidSignatureFormat));
    }

    #[test]
    fn ec_cannot_encrypt() {
        let key = SecretKey::generate(KeyType::Sm2).expect("should generate");
        let err = key.encrypt(b"secret").expect_err("should fail");
        assert!(err.is(Err::UnsupportedOperation));
    }
}
