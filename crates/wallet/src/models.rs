use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use did_core::KeyType;
use serde::{Deserialize, Serialize};

/// A named group of wallet entries (credentials, keys, DIDs).
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    /// Unique within the user's wallet.
    pub id: String,
    /// Kind of entry grouped, eg. "credential" or "key".
    #[serde(rename = "type")]
    pub type_: String,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// DID of the owning user.
    pub owner: String,
    /// Optional tags.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

/// Metadata for a key held by the user's key manager. The private key stays in the manager.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyRecord {
    /// Key manager's identifier for the key.
    pub id: String,
    /// Key type.
    #[serde(rename = "type")]
    pub key_type: KeyType,
    /// DID controlling the key.
    pub controller: String,
    /// Public key as returned by the key manager (SPKI DER).
    pub public_key: Vec<u8>,
    /// When the key was recorded.
    pub created: DateTime<Utc>,
    /// Optional tags.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

impl KeyRecord {
    /// New key metadata, created now, with no tags.
    #[must_use]
    pub fn new(id: &str, key_type: KeyType, controller: &str, public_key: Vec<u8>) -> Self {
        Self {
            id: id.to_string(),
            key_type,
            controller: controller.to_string(),
            public_key,
            created: Utc::now(),
            tags: BTreeMap::new(),
        }
    }
}
