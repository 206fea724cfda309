use did_core::error::Err;
use did_core::{tracerr, KeyManager, KeyType, Result};

use crate::client::KeyVault;

/// `KeyManager` backed by Azure Key Vault. Private keys never leave the vault.
#[derive(Clone, Debug)]
pub struct AzureKeyManager {
    // Azure key vault client.
    pub(crate) client: KeyVault,
    // Prefix for the names of keys created by this manager. This is used to differentiate keys in
    // the same Azure Key Vault instance to support, for example, multi-tenancy.
    prefix: String,
}

impl AzureKeyManager {
    /// Create a key manager.
    ///
    /// # Arguments
    ///
    /// * `client` - Azure Key Vault client.
    /// * `prefix` - Key names are `<prefix>-<uuid>`. Only keys with the prefix are listed.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidConfig` - The prefix is empty or contains characters the vault does not
    ///   allow in key names.
    pub fn new(client: KeyVault, prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            tracerr!(Err::InvalidConfig, "key name prefix must be alphanumeric or '-': {prefix}");
        }
        Ok(Self { client, prefix })
    }

    fn key_name(&self) -> String {
        format!("{}-{}", self.prefix, uuid::Uuid::new_v4())
    }
}

/// Key manager implementation backed by Azure Key Vault.
impl KeyManager for AzureKeyManager {
    /// Create a key in the vault. Only `ECDSAP256` and `RSA2048` keys are supported.
    async fn create(&self, key_type: KeyType) -> Result<(String, Vec<u8>)> {
        let key_name = self.key_name();
        let bundle = self.client.create_key(&key_name, key_type).await?;
        let public_key = bundle.key.to_spki_der()?;
        tracing::debug!("created {key_type} key {key_name} in vault");
        Ok((key_name, public_key))
    }

    async fn get(&self, key_id: &str) -> Result<Vec<u8>> {
        self.client.get_key(key_id).await?.key.to_spki_der()
    }

    /// The vault does not accept private keys from this client.
    async fn import_private_key(&self, _: &[u8], _: KeyType) -> Result<String> {
        tracerr!(Err::UnsupportedOperation, "Azure Key Vault keys cannot be imported")
    }

    /// The vault does not release private keys.
    async fn export_private_key(&self, key_id: &str) -> Result<Vec<u8>> {
        // unknown keys still report KeyNotFound
        self.client.get_key(key_id).await?;
        tracerr!(Err::UnsupportedOperation, "Azure Key Vault keys cannot be exported")
    }

    /// Soft-delete the key. The vault purges it at the end of its retention period.
    async fn delete(&self, key_id: &str) -> Result<()> {
        let deleted = self.client.delete_key(key_id).await?;
        match deleted.scheduled_purge_date {
            Some(date) => tracing::info!("deleted key {key_id}, scheduled for purge at {date}"),
            None => tracing::info!("deleted key {key_id}"),
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>> {
        let prefix = format!("{}-", self.prefix);
        let keys = self.client.list_keys().await?;
        Ok(keys
            .iter()
            .map(crate::key_bundle::KeyListItem::name)
            .filter(|name| name.starts_with(&prefix))
            .map(ToString::to_string)
            .collect())
    }

    async fn key_type(&self, key_id: &str) -> Result<KeyType> {
        self.client.get_key(key_id).await?.key.sdk_key_type()
    }
}
