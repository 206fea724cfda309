use did_core::{Crypto, Result};

use crate::keyring::LocalKeyManager;

/// Sign, verify, encrypt and decrypt with keys held by the local manager.
impl Crypto for LocalKeyManager {
    /// Sign `data`. ECDSA (P-256 and SM2) signatures are DER encoded, Ed25519 signatures are 64
    /// raw bytes and RSA signatures are PKCS#1 v1.5.
    async fn sign(&self, key_id: &str, data: &[u8]) -> Result<Vec<u8>> {
        let signature = self.key(key_id)?.sign(data)?;
        tracing::debug!("signed {} bytes with key {key_id}", data.len());
        Ok(signature)
    }

    async fn verify(&self, key_id: &str, data: &[u8], signature: &[u8]) -> Result<bool> {
        self.key(key_id)?.verify(data, signature)
    }

    /// Encrypt with RSA-OAEP-SHA256. Only RSA keys can encrypt.
    async fn encrypt(&self, key_id: &str, plaintext: &[u8]) -> Result<Vec<u8>> {
        self.key(key_id)?.encrypt(plaintext)
    }

    async fn decrypt(&self, key_id: &str, ciphertext: &[u8]) -> Result<Vec<u8>> {
        self.key(key_id)?.decrypt(ciphertext)
    }
}

#[cfg(test)]
mod tests {
    use did_core::error::Err;
    use did_core::{KeyManager, KeyType};

    use super::*;

    #[tokio::test]
    async fn sign_verify_all_types() {
        let manager = LocalKeyManager::new();
        for key_type in [KeyType::Ed25519, KeyType::EcdsaP256, KeyType::Rsa2048, KeyType::Sm2] {
            let (key_id, _) = manager.create(key_type).await.expect("should create");
            let sig = manager.sign(&key_id, b"Hello, world!").await.expect("should sign");
            assert!(manager.verify(&key_id, b"Hello, world!", &sig).await.expect("verify"));
            assert!(!manager.verify(&key_id, b"Hello, World!", &sig).await.expect("verify"));
        }
    }

    #[tokio::test]
    async fn other_key_does_not_verify() {
        let manager = LocalKeyManager::new();
        let (first, _) = manager.create(KeyType::EcdsaP256).await.expect("should create");
        let (second, _) = manager.create(KeyType::EcdsaP256).await.expect("should create");

        let sig = manager.sign(&first, b"message").await.expect("should sign");
        assert!(!manager.verify(&second, b"message", &sig).await.expect("should verify"));
    }

    #[tokio::test]
    async fn rsa_encrypt_decrypt() {
        let manager = LocalKeyManager::new();
        let (key_id, _) = manager.create(KeyType::Rsa2048).await.expect("should create");

        let ciphertext = manager.encrypt(&key_id, b"secret message").await.expect("encrypt");
        assert_eq!(ciphertext.len(), 256);
        let plaintext = manager.decrypt(&key_id, &ciphertext).await.expect("decrypt");
        assert_eq!(plaintext, b"secret message");
    }

    #[tokio::test]
    async fn unknown_key() {
        let manager = LocalKeyManager::new();
        let err = manager.sign("missing", b"data").await.expect_err("should fail");
        assert!(err.is(Err::KeyNotFound));
        let err = manager.verify("missing", b"data", b"sig").await.expect_err("should fail");
        assert!(err.is(Err::KeyNotFound));
    }

    #[tokio::test]
    async fn ed25519_cannot_encrypt() {
        let manager = LocalKeyManager::new();
        let (key_id, _) = manager.create(KeyType::Ed25519).await.expect("should create");
        let err = manager.encrypt(&key_id, b"data").await.expect_err("should fail");
        assert!(err.is(Err::UnsupportedOperation));
    }
}
