use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use did_core::error::Err;
use did_core::{tracerr, Crypto, KeyManager, Result};

use crate::WalletUser;

/// A multi-user wallet. Users are keyed by DID and each brings its own key manager.
#[derive(Debug)]
pub struct Wallet<K> {
    users: RwLock<HashMap<String, Arc<WalletUser<K>>>>,
}

impl<K> Default for Wallet<K> {
    fn default() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }
}

impl<K: KeyManager + Crypto> Wallet<K> {
    /// An empty wallet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user whose keys are held by `manager`.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidInput` - `did` is malformed or already has a user.
    pub fn add_user(&self, did: &str, manager: K) -> Result<Arc<WalletUser<K>>> {
        let user = Arc::new(WalletUser::new(did, manager)?);

        let mut users = self.users.write().expect("lock on wallet users failed");
        if users.contains_key(did) {
            tracerr!(Err::InvalidInput, "user {did} already exists");
        }
        users.insert(did.to_string(), Arc::clone(&user));

        tracing::debug!("added wallet user {did}");
        Ok(user)
    }

    /// The user for `did`.
    ///
    /// # Errors
    ///
    /// * `Err::NotFound` - No user with the DID.
    pub fn get_user(&self, did: &str) -> Result<Arc<WalletUser<K>>> {
        match self.users.read().expect("lock on wallet users failed").get(did) {
            Some(user) => Ok(Arc::clone(user)),
            None => tracerr!(Err::NotFound, "user {did} not found"),
        }
    }

    /// DIDs of every user, sorted.
    #[must_use]
    pub fn users(&self) -> Vec<String> {
        let mut dids: Vec<String> =
            self.users.read().expect("lock on wallet users failed").keys().cloned().collect();
        dids.sort();
        dids
    }
}
