use did_core::error::Err;
use did_core::{tracerr, Crypto, KeyManager, KeyType, Result};
use p256::ecdsa::signature::hazmat::PrehashVerifier;
use p256::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use sha2::{Digest, Sha256};

use crate::keyring::AzureKeyManager;

const RSA_OAEP_256: &str = "RSA-OAEP-256";

/// Implementation of the [`Crypto`] trait for Azure Key Vault keys.
impl Crypto for AzureKeyManager {
    /// Sign the SHA-256 digest of `data` in the vault. ECDSA signatures are returned DER encoded,
    /// RSA signatures are PKCS#1 v1.5.
    async fn sign(&self, key_id: &str, data: &[u8]) -> Result<Vec<u8>> {
        let key_type = self.key_type(key_id).await?;
        let digest = Sha256::digest(data);

        match key_type {
            KeyType::EcdsaP256 => {
                // Azure returns r and s concatenated
                let raw = self.client.sign(key_id, "ES256", &digest).await?;
                match p256::ecdsa::Signature::from_slice(&raw) {
                    Ok(sig) => Ok(sig.to_der().as_bytes().to_vec()),
                    Err(e) => tracerr!(Err::SigningError, "vault returned a bad signature: {e}"),
                }
            }
            _ => self.client.sign(key_id, "RS256", &digest).await,
        }
    }

    /// Verify locally against the public key fetched from the vault.
    async fn verify(&self, key_id: &str, data: &[u8], signature: &[u8]) -> Result<bool> {
        if signature.is_empty() {
            tracerr!(Err::InvalidInput, "signature cannot be empty");
        }
        let bundle = self.client.get_key(key_id).await?;
        let der = bundle.key.to_spki_der()?;
        let digest = Sha256::digest(data);

        match bundle.key.sdk_key_type()? {
            KeyType::EcdsaP256 => {
                let Ok(sig) = p256::ecdsa::Signature::from_der(signature) else {
                    tracerr!(Err::InvalidSignatureFormat, "invalid DER ECDSA signature");
                };
                let Ok(verifying_key) = p256::ecdsa::VerifyingKey::from_public_key_der(&der) else {
                    tracerr!(Err::InvalidKey, "invalid P-256 public key from vault");
                };
                Ok(verifying_key.verify_prehash(&digest, &sig).is_ok())
            }
            _ => {
                let Ok(public) = RsaPublicKey::from_public_key_der(&der) else {
                    tracerr!(Err::InvalidKey, "invalid RSA public key from vault");
                };
                Ok(public.verify(Pkcs1v15Sign::new::<Sha256>(), &digest, signature).is_ok())
            }
        }
    }

    /// Encrypt with RSA-OAEP-256 in the vault. Only RSA keys can encrypt.
    async fn encrypt(&self, key_id: &str, plaintext: &[u8]) -> Result<Vec<u8>> {
        self.require_rsa(key_id).await?;
        self.client.encrypt(key_id, RSA_OAEP_256, plaintext).await
    }

    async fn decrypt(&self, key_id: &str, ciphertext: &[u8]) -> Result<Vec<u8>> {
        self.require_rsa(key_id).await?;
        self.client.decrypt(key_id, RSA_OAEP_256, ciphertext).await
    }
}

impl AzureKeyManager {
    async fn require_rsa(&self, key_id: &str) -> Result<()> {
        let key_type = self.key_type(key_id).await?;
        if key_type != KeyType::Rsa2048 {
            tracerr!(Err::UnsupportedOperation, "{key_type} keys cannot encrypt or decrypt");
        }
        Ok(())
    }
}
