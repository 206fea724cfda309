//! # SBP DID SDK
//!
//! Decentralized Identifier (DID) utilities: key-pair generation, identifier derivation, DID
//! document assembly and mutation, hashing, signing and encryption.
//!
//! The core functionality lives in [`did_core`] and is re-exported here. Key-manager backends and
//! the registry and wallet collaborators are enabled by cargo features:
//!
//! | Feature    | Crate      | Provides                                             |
//! |------------|------------|------------------------------------------------------|
//! | `keyring`  | `keyring`  | In-process key manager (default)                     |
//! | `azure-kv` | `azure-kv` | Remote key manager backed by Azure Key Vault         |
//! | `registry` | `registry` | Client for the DID registry REST API                 |
//! | `wallet`   | `wallet`   | Per-user wallet of DID documents, keys and credentials |

pub use did_core::*;

/// Remote key manager backed by Azure Key Vault.
#[cfg(feature = "azure-kv")]
pub mod azure_kv {
    pub use azure_kv::*;
}

/// In-process key manager.
#[cfg(feature = "keyring")]
pub mod keyring {
    pub use keyring::*;
}

/// DID registry REST API client.
#[cfg(feature = "registry")]
pub mod registry {
    pub use registry::*;
}

/// Per-user wallet.
#[cfg(feature = "wallet")]
pub mod wallet {
    pub use wallet::*;
}
