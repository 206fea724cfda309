//! # Wallet
//!
//! Holds DID documents, verifiable credentials, key metadata and collections for any number of
//! users. Each user's keys live in the key manager supplied when the user is added; the wallet
//! only records their metadata. A user's DID document can be written to the registry with
//! [`WalletUser::sync_document`].

mod models;
mod user;
mod wallet;

pub use models::{Collection, KeyRecord};
/// Credentials are stored in the registry's W3C representation.
pub use registry::VerifiableCredential as Credential;
pub use user::WalletUser;
pub use wallet::Wallet;
