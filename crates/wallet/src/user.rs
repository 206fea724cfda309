use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use did_core::error::Err;
use did_core::{
    tracerr, validate_identifier, verification_method_from_manager, Crypto, DidDocument,
    KeyManager, KeyPurpose, KeyType, Result, VerificationMethod,
};
use registry::{RegistryClient, UpdateDidRequest};
use serde_json::Value;

use crate::models::{Collection, KeyRecord};
use crate::Credential;

#[derive(Debug, Default)]
struct UserState {
    document: Option<DidDocument>,
    credentials: HashMap<String, Credential>,
    keys: HashMap<String, KeyRecord>,
    collections: HashMap<String, Collection>,
}

/// A wallet user: one DID, its key manager and the user's documents, credentials, key metadata
/// and collections.
///
/// State is guarded by a lock that is never held across a key manager or registry call.
#[derive(Debug)]
pub struct WalletUser<K> {
    did: String,
    manager: K,
    state: RwLock<UserState>,
}

impl<K: KeyManager + Crypto> WalletUser<K> {
    /// Create a user for `did` with keys held by `manager`.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidInput` - `did` is not a valid identifier.
    pub fn new(did: &str, manager: K) -> Result<Self> {
        validate_identifier(did)?;
        Ok(Self {
            did: did.to_string(),
            manager,
            state: RwLock::new(UserState::default()),
        })
    }

    /// The user's DID.
    #[must_use]
    pub fn did(&self) -> &str {
        &self.did
    }

    /// The key manager holding the user's keys.
    pub const fn key_manager(&self) -> &K {
        &self.manager
    }

    fn read(&self) -> RwLockReadGuard<'_, UserState> {
        self.state.read().expect("lock on wallet user failed")
    }

    fn write(&self) -> RwLockWriteGuard<'_, UserState> {
        self.state.write().expect("lock on wallet user failed")
    }

    // ---- DID document ----

    /// Set (or replace) the user's DID document.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidInput` - The document describes a different DID or is not well formed.
    pub fn set_document(&self, document: DidDocument) -> Result<()> {
        if document.id != self.did {
            tracerr!(Err::InvalidInput, "document {} does not belong to {}", document.id, self.did);
        }
        document.validate()?;
        self.write().document = Some(document);
        Ok(())
    }

    /// A copy of the user's DID document.
    ///
    /// # Errors
    ///
    /// * `Err::NotFound` - No document has been set.
    pub fn document(&self) -> Result<DidDocument> {
        match &self.read().document {
            Some(document) => Ok(document.clone()),
            None => tracerr!(Err::NotFound, "no DID document for {}", self.did),
        }
    }

    /// Add a verification method to the user's DID document.
    ///
    /// # Errors
    ///
    /// * `Err::NotFound` - No document has been set.
    /// * `Err::InvalidInput` - The method ID is already in use or the method is malformed.
    pub fn add_did_key(&self, method: VerificationMethod, usages: &[KeyPurpose]) -> Result<()> {
        let mut state = self.write();
        let Some(document) = state.document.as_mut() else {
            tracerr!(Err::NotFound, "no DID document for {}", self.did);
        };
        document.add_key(method, usages)
    }

    /// Remove a verification method, and every reference to it, from the user's DID document.
    /// Returns whether the method was present.
    ///
    /// # Errors
    ///
    /// * `Err::NotFound` - No document has been set.
    pub fn remove_did_key(&self, key_id: &str) -> Result<bool> {
        let mut state = self.write();
        let Some(document) = state.document.as_mut() else {
            tracerr!(Err::NotFound, "no DID document for {}", self.did);
        };
        Ok(document.remove_key(key_id))
    }

    /// Create a key with the user's key manager and add it to the DID document as
    /// `<did>#<key id>`. The key's metadata is recorded in the wallet.
    ///
    /// The key is deleted from the manager again if it cannot be added to the document.
    ///
    /// # Errors
    ///
    /// * `Err::NotFound` - No document has been set.
    /// * Any error from the key manager.
    pub async fn create_did_key(
        &self, key_type: KeyType, usages: &[KeyPurpose],
    ) -> Result<VerificationMethod> {
        if self.read().document.is_none() {
            tracerr!(Err::NotFound, "no DID document for {}", self.did);
        }

        let (key_id, public_key) = self.manager.create(key_type).await?;
        let method = verification_method_from_manager(&self.did, &key_id, &self.manager).await;
        let added = method.and_then(|method| {
            let record = KeyRecord::new(&key_id, key_type, &self.did, public_key);
            self.add_created_key(method, record, usages)
        });

        if added.is_err() {
            if let Err(e) = self.manager.delete(&key_id).await {
                tracing::warn!("failed to discard key {key_id}: {e}");
            }
        }
        added
    }

    fn add_created_key(
        &self, method: VerificationMethod, record: KeyRecord, usages: &[KeyPurpose],
    ) -> Result<VerificationMethod> {
        let mut state = self.write();
        let Some(document) = state.document.as_mut() else {
            tracerr!(Err::NotFound, "DID document for {} was removed", self.did);
        };
        document.add_key(method.clone(), usages)?;
        state.keys.insert(record.id.clone(), record);

        tracing::debug!("added key {} to {}", method.id, self.did);
        Ok(method)
    }

    /// Sign `data` with one of the user's keys.
    ///
    /// # Errors
    ///
    /// Any error from the key manager.
    pub async fn sign_with(&self, key_id: &str, data: &[u8]) -> Result<Vec<u8>> {
        self.manager.sign(key_id, data).await
    }

    /// Write the user's DID document to the registry. The document field of `request` is
    /// replaced with the current document.
    ///
    /// # Errors
    ///
    /// * `Err::NotFound` - No document has been set.
    /// * `Err::SerializationError` - The document cannot be serialized.
    /// * Any error from the registry client.
    pub async fn sync_document(
        &self, client: &RegistryClient, mut request: UpdateDidRequest,
    ) -> Result<Value> {
        let json = match &self.read().document {
            Some(document) => document.to_json()?,
            None => tracerr!(Err::NotFound, "no DID document for {}", self.did),
        };
        request.did_document = match String::from_utf8(json) {
            Ok(json) => json,
            Err(e) => tracerr!(Err::SerializationError, "document is not UTF-8: {e}"),
        };

        tracing::info!("syncing DID document for {}", self.did);
        client.update_did(&request).await
    }

    // ---- Credentials ----

    /// Store a credential, keyed by its ID.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidInput` - The ID is empty or already in use.
    pub fn add_credential(&self, credential: Credential) -> Result<()> {
        let id = credential.id.clone();
        insert(&mut self.write().credentials, "credential", &id, credential)
    }

    /// A stored credential.
    ///
    /// # Errors
    ///
    /// * `Err::NotFound` - No credential with the ID.
    pub fn credential(&self, id: &str) -> Result<Credential> {
        lookup(&self.read().credentials, "credential", id)
    }

    /// Delete a stored credential.
    ///
    /// # Errors
    ///
    /// * `Err::NotFound` - No credential with the ID.
    pub fn delete_credential(&self, id: &str) -> Result<Credential> {
        remove(&mut self.write().credentials, "credential", id)
    }

    // ---- Key metadata ----

    /// Record metadata for a key.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidInput` - The ID is empty or already in use.
    pub fn add_key(&self, record: KeyRecord) -> Result<()> {
        let id = record.id.clone();
        insert(&mut self.write().keys, "key", &id, record)
    }

    /// Metadata for a key.
    ///
    /// # Errors
    ///
    /// * `Err::NotFound` - No key with the ID.
    pub fn key(&self, id: &str) -> Result<KeyRecord> {
        lookup(&self.read().keys, "key", id)
    }

    /// Delete a key's metadata. The key itself stays in the key manager.
    ///
    /// # Errors
    ///
    /// * `Err::NotFound` - No key with the ID.
    pub fn delete_key(&self, id: &str) -> Result<KeyRecord> {
        remove(&mut self.write().keys, "key", id)
    }

    // ---- Collections ----

    /// Add a collection.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidInput` - The ID is empty or already in use.
    pub fn add_collection(&self, collection: Collection) -> Result<()> {
        let id = collection.id.clone();
        insert(&mut self.write().collections, "collection", &id, collection)
    }

    /// A collection.
    ///
    /// # Errors
    ///
    /// * `Err::NotFound` - No collection with the ID.
    pub fn collection(&self, id: &str) -> Result<Collection> {
        lookup(&self.read().collections, "collection", id)
    }

    /// Delete a collection.
    ///
    /// # Errors
    ///
    /// * `Err::NotFound` - No collection with the ID.
    pub fn delete_collection(&self, id: &str) -> Result<Collection> {
        remove(&mut self.write().collections, "collection", id)
    }
}

fn insert<T>(entries: &mut HashMap<String, T>, kind: &str, id: &str, value: T) -> Result<()> {
    if id.is_empty() {
        tracerr!(Err::InvalidInput, "{kind} ID cannot be empty");
    }
    if entries.contains_key(id) {
        tracerr!(Err::InvalidInput, "{kind} {id} already exists");
    }
    entries.insert(id.to_string(), value);
    Ok(())
}

fn lookup<T: Clone>(entries: &HashMap<String, T>, kind: &str, id: &str) -> Result<T> {
    match entries.get(id) {
        Some(value) => Ok(value.clone()),
        None => tracerr!(Err::NotFound, "{kind} {id} not found"),
    }
}

fn remove<T>(entries: &mut HashMap<String, T>, kind: &str, id: &str) -> Result<T> {
    match entries.remove(id) {
        Some(value) => Ok(value),
        None => tracerr!(Err::NotFound, "{kind} {id} not found"),
    }
}

#[cfg(test)]
mod tests {
    use did_core::{Algorithm, KeyPair};
    use keyring::LocalKeyManager;

    use super::*;

    const DID: &str = "did:sbp:0123456789abcdef";

    fn user_with_document() -> WalletUser<LocalKeyManager> {
        let user = WalletUser::new(DID, LocalKeyManager::new()).expect("should create");
        let keys = KeyPair::generate(Algorithm::Ecdsa, "primary").expect("should generate");
        let document =
            DidDocument::assemble(&keys, Algorithm::Ecdsa, DID, []).expect("should assemble");
        user.set_document(document).expect("should set");
        user
    }

    #[test]
    fn invalid_did() {
        let err = WalletUser::new("not-a-did", LocalKeyManager::new()).expect_err("should fail");
        assert!(err.is(Err::InvalidInput));
    }

    #[test]
    fn document_for_other_did() {
        let user = WalletUser::new(DID, LocalKeyManager::new()).expect("should create");
        let document = DidDocument::new("did:sbp:ffff").expect("should create");
        let err = user.set_document(document).expect_err("should fail");
        assert!(err.is(Err::InvalidInput));
        assert!(user.document().expect_err("no document").is(Err::NotFound));
    }

    #[tokio::test]
    async fn create_and_remove_did_key() {
        let user = user_with_document();

        let method = user
            .create_did_key(KeyType::EcdsaP256, &[KeyPurpose::Authentication])
            .await
            .expect("should create key");
        let key_id = method.id.strip_prefix(&format!("{DID}#")).expect("key fragment");
        assert!(method.public_key_jwk.is_some());

        let document = user.document().expect("document");
        assert!(document.verification_method(&method.id).is_some());
        assert!(document.references(KeyPurpose::Authentication).contains(&method.id));

        let record = user.key(key_id).expect("key metadata");
        assert_eq!(record.key_type, KeyType::EcdsaP256);
        assert_eq!(record.controller, DID);

        let sig = user.sign_with(key_id, b"message").await.expect("should sign");
        assert!(user.key_manager().verify(key_id, b"message", &sig).await.expect("verify"));

        assert!(user.remove_did_key(&method.id).expect("should remove"));
        assert!(!user.remove_did_key(&method.id).expect("idempotent"));
        let document = user.document().expect("document");
        assert!(!document.references(KeyPurpose::Authentication).contains(&method.id));
    }

    #[tokio::test]
    async fn create_key_needs_document() {
        let user = WalletUser::new(DID, LocalKeyManager::new()).expect("should create");
        let err = user
            .create_did_key(KeyType::Ed25519, &[KeyPurpose::Authentication])
            .await
            .expect_err("should fail");
        assert!(err.is(Err::NotFound));
        assert!(user.key_manager().list().await.expect("list").is_empty());
    }

    #[test]
    fn duplicate_did_key() {
        let user = user_with_document();
        let method = user.document().expect("document").verification_methods()[0].clone();
        let err = user.add_did_key(method, &[KeyPurpose::AssertionMethod]).expect_err("dup");
        assert!(err.is(Err::InvalidInput));
    }

    #[test]
    fn credentials() {
        let user = user_with_document();
        let credential = Credential {
            id: "urn:uuid:vc-1".to_string(),
            issuer: "did:sbp:issuer".to_string(),
            ..Credential::default()
        };

        user.add_credential(credential.clone()).expect("should add");
        let err = user.add_credential(credential).expect_err("duplicate");
        assert!(err.is(Err::InvalidInput));

        assert_eq!(user.credential("urn:uuid:vc-1").expect("get").issuer, "did:sbp:issuer");
        user.delete_credential("urn:uuid:vc-1").expect("should delete");
        assert!(user.credential("urn:uuid:vc-1").expect_err("gone").is(Err::NotFound));
        assert!(user.delete_credential("urn:uuid:vc-1").expect_err("gone").is(Err::NotFound));
    }

    #[test]
    fn collections_and_keys() {
        let user = user_with_document();

        let collection = Collection {
            id: "work".to_string(),
            type_: "credential".to_string(),
            name: "Work".to_string(),
            owner: DID.to_string(),
            ..Collection::default()
        };
        user.add_collection(collection.clone()).expect("should add");
        assert_eq!(user.collection("work").expect("get"), collection);
        user.delete_collection("work").expect("should delete");
        assert!(user.collection("work").expect_err("gone").is(Err::NotFound));

        let err = user.add_collection(Collection::default()).expect_err("empty ID");
        assert!(err.is(Err::InvalidInput));

        let record = KeyRecord::new("k1", KeyType::Rsa2048, DID, vec![1, 2, 3]);
        user.add_key(record.clone()).expect("should add");
        assert!(user.add_key(record).expect_err("duplicate").is(Err::InvalidInput));
        assert_eq!(user.delete_key("k1").expect("should delete").public_key, vec![1, 2, 3]);
    }
}
