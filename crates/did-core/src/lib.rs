//! # DID Core
//! Types, traits and functions for generating keys, deriving Decentralized Identifiers (DIDs) and
//! assembling DID Documents.

pub mod config;
pub(crate) mod crypto;
pub(crate) mod document;
pub mod error;
pub mod hashing;
pub(crate) mod identifier;
pub(crate) mod keys;

pub use config::{Config, ProjectVisibility};
pub use crypto::{decrypt, encrypt, sign, verify, verify_hex};
pub use document::service::Service;
pub use document::verification_method::{KeyPurpose, VerificationMethod};
pub use document::{DidDocument, DID_CONTEXT, JWS_2020_CONTEXT};
pub use hashing::HashAlgorithm;
pub use identifier::{
    derive_identifier, extract_identifier_part, extract_method, validate_identifier, DID_PREFIX,
};
pub use keys::keypair::{KeyPair, PrivateKey, PublicKey, PublicKeySource};
pub use keys::manager::{spki_to_jwk, verification_method_from_manager, Crypto, KeyManager};
pub use keys::{Algorithm, Jwk, KeyType};

/// Result type for DID Core.
pub type Result<T, E = error::Error> = core::result::Result<T, E>;
