use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use did_core::error::Err;
use did_core::{tracerr, KeyManager, KeyType, Result};

use crate::secret::SecretKey;

/// In-memory key manager. Keys disappear when the last clone of the manager is dropped.
///
/// Every operation takes the same lock, so concurrent callers see operations in a single order.
#[derive(Clone, Default)]
pub struct LocalKeyManager {
    pub(crate) keys: Arc<Mutex<HashMap<String, SecretKey>>>,
}

impl std::fmt::Debug for LocalKeyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.keys.lock().expect("lock on keys mutex failed").len();
        f.debug_struct("LocalKeyManager").field("keys", &count).finish()
    }
}

impl LocalKeyManager {
    /// Create an empty key manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a key under a fresh identifier.
    fn insert(&self, key: SecretKey) -> String {
        let mut keys = self.keys.lock().expect("lock on keys mutex failed");
        let mut key_id = uuid::Uuid::new_v4().to_string();
        while keys.contains_key(&key_id) {
            key_id = uuid::Uuid::new_v4().to_string();
        }
        keys.insert(key_id.clone(), key);
        key_id
    }

    /// A copy of the key held under `key_id`.
    pub(crate) fn key(&self, key_id: &str) -> Result<SecretKey> {
        let keys = self.keys.lock().expect("lock on keys mutex failed");
        match keys.get(key_id) {
            Some(key) => Ok(key.clone()),
            None => tracerr!(Err::KeyNotFound, "no key with ID {key_id}"),
        }
    }
}

impl KeyManager for LocalKeyManager {
    async fn create(&self, key_type: KeyType) -> Result<(String, Vec<u8>)> {
        let key = SecretKey::generate(key_type)?;
        let public_key = key.public_key_der()?;
        let key_id = self.insert(key);
        tracing::debug!("created {key_type} key {key_id}");
        Ok((key_id, public_key))
    }

    async fn get(&self, key_id: &str) -> Result<Vec<u8>> {
        self.key(key_id)?.public_key_der()
    }

    async fn import_private_key(&self, private_key: &[u8], key_type: KeyType) -> Result<String> {
        let key = SecretKey::from_der(private_key, key_type)?;
        let key_id = self.insert(key);
        tracing::debug!("imported {key_type} key {key_id}");
        Ok(key_id)
    }

    async fn export_private_key(&self, key_id: &str) -> Result<Vec<u8>> {
        self.key(key_id)?.to_der()
    }

    async fn delete(&self, key_id: &str) -> Result<()> {
        let mut keys = self.keys.lock().expect("lock on keys mutex failed");
        if keys.remove(key_id).is_none() {
            tracerr!(Err::KeyNotFound, "no key with ID {key_id}");
        }
        tracing::debug!("deleted key {key_id}");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>> {
        let keys = self.keys.lock().expect("lock on keys mutex failed");
        Ok(keys.keys().cloned().collect())
    }

    async fn key_type(&self, key_id: &str) -> Result<KeyType> {
        Ok(self.key(key_id)?.key_type())
    }
}
