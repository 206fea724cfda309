//! `KeyManager` and `Crypto` implementations for keys that are generated and used in-memory and
//! disappear when out of scope.
//!
//! Supported key types and their private key formats for import and export:
//!
//! | Key type    | Private key   | Signature            | Encryption       |
//! |-------------|---------------|----------------------|------------------|
//! | `ED25519`   | PKCS#8 DER    | Ed25519 (64 bytes)   | not supported    |
//! | `ECDSAP256` | SEC1 DER      | ECDSA P-256, DER     | not supported    |
//! | `RSA2048`   | PKCS#1 DER    | RSA PKCS#1 v1.5      | RSA-OAEP-SHA256  |
//! | `SM2`       | SEC1 DER      | ECDSA P-256, DER     | not supported    |
//!
//! Public keys are always returned as SPKI DER.

mod keyring;
mod secret;
mod signer;

pub use keyring::LocalKeyManager;
