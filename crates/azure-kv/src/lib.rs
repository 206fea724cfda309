//! # `KeyManager` and `Crypto` implementations for Azure Key Vault
//!
//! Keys are created in the vault and never leave it: signing, encryption and decryption are
//! performed by the vault, verification is done locally with the public key the vault returns.
//!
//! | Key type    | Signing            | Encryption     |
//! |-------------|--------------------|----------------|
//! | `ECDSAP256` | `ES256`            | not supported  |
//! | `RSA2048`   | `RS256`            | `RSA-OAEP-256` |
//!
//! Other key types are rejected with `UnsupportedAlgorithm`. Deleted keys are soft-deleted and
//! purged by the vault at the end of its retention period.

mod auth;
mod client;
mod key_bundle;
mod keyring;
mod signer;

pub use auth::AzureConfig;
pub use client::KeyVault;
pub use key_bundle::{Deleted, JsonWebKey, KeyAttributes, KeyBundle, KeyListItem};
pub use keyring::AzureKeyManager;
