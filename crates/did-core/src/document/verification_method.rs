//! Verification methods allow public keys to be associated with a DID.

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Err, Error};
use crate::keys::keypair::PublicKeySource;
use crate::{tracerr, Algorithm, Jwk, Result};

/// A DID document can express verification methods, such as cryptographic public keys, which can be
/// used to authenticate or authorize interactions with the DID subject or associated parties.
///
/// At most one of `public_key_hex` and `public_key_base58` is set.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VerificationMethod {
    /// Identifier for the verification method: the DID followed by `#` and a fragment.
    pub id: String,
    /// The type of verification method. One that is registered in a DID specification registry.
    /// https://www.w3.org/TR/did-spec-registries/
    #[serde(rename = "type")]
    pub type_: String,
    /// Identifier for the controller of the verification method. A DID.
    pub controller: String,
    /// Hex-encoded public key bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_hex: Option<String>,
    /// Base58-encoded public key bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_base58: Option<String>,
    /// The public key as a JWK.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_jwk: Option<Jwk>,
}

impl VerificationMethod {
    /// Build a verification method `<controller>#<fragment>` for a public key. The key bytes are
    /// carried as base58; a JWK is added when the bytes parse as a key of `algorithm`.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidInput` - The public key is empty or not valid hex.
    /// * `Err::InvalidKey` - A key pair of a different algorithm was supplied.
    pub fn from_public_key<'a>(
        public_key: impl Into<PublicKeySource<'a>>, algorithm: Algorithm, controller: &str,
        fragment: &str,
    ) -> Result<Self> {
        let source = public_key.into();
        let bytes = source.to_bytes()?;

        let jwk = match source {
            PublicKeySource::KeyPair(_) => Some(source.to_public_key(algorithm)?.to_jwk()?),
            _ => match source.to_public_key(algorithm) {
                Ok(public) => public.to_jwk().ok(),
                Err(_) => {
                    tracing::debug!("no JWK for {fragment}: key bytes are not a {algorithm} key");
                    None
                }
            },
        };

        Ok(Self {
            id: format!("{controller}#{fragment}"),
            type_: algorithm.verification_method_type().to_string(),
            controller: controller.to_string(),
            public_key_hex: None,
            public_key_base58: Some(bs58::encode(bytes).into_string()),
            public_key_jwk: jwk,
        })
    }

    /// Check the method is well formed.
    pub(crate) fn check(&self) -> Result<()> {
        if self.id.is_empty() {
            tracerr!(Err::InvalidInput, "verification method ID cannot be empty");
        }
        if self.public_key_hex.is_some() && self.public_key_base58.is_some() {
            tracerr!(
                Err::InvalidInput,
                "verification method {} has more than one public key encoding",
                self.id
            );
        }
        Ok(())
    }
}

/// Key purpose type. Each purpose names a verification relationship list in the DID document.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyPurpose {
    #[default]
    /// The authentication verification relationship is used to specify how the DID subject is
    /// expected to be authenticated, for purposes such as logging into a website or engaging in
    /// any sort of challenge-response protocol.
    Authentication,
    /// The assertionMethod verification relationship is used to specify how the DID subject is
    /// expected to express claims, such as for the purposes of issuing a Verifiable Credential
    AssertionMethod,
    /// The capabilityInvocation verification relationship is used to specify a verification method
    /// that might be used by the DID subject to invoke a cryptographic capability, such as the
    /// authorization to update the DID Document.
    CapabilityInvocation,
    /// The capabilityDelegation verification relationship is used to specify a mechanism that might
    /// be used by the DID subject to delegate a cryptographic capability to another party.
    CapabilityDelegation,
    /// The keyAgreement verification relationship is used to specify how an entity can generate
    /// encryption material in order to transmit confidential information intended for the DID
    /// subject.
    KeyAgreement,
}

impl KeyPurpose {
    /// Every purpose, in document order.
    pub const ALL: [Self; 5] = [
        Self::Authentication,
        Self::AssertionMethod,
        Self::KeyAgreement,
        Self::CapabilityInvocation,
        Self::CapabilityDelegation,
    ];
}

impl Display for KeyPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Authentication => write!(f, "authentication"),
            Self::AssertionMethod => write!(f, "assertionMethod"),
            Self::CapabilityInvocation => write!(f, "capabilityInvocation"),
            Self::CapabilityDelegation => write!(f, "capabilityDelegation"),
            Self::KeyAgreement => write!(f, "keyAgreement"),
        }
    }
}

impl FromStr for KeyPurpose {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match Self::ALL.into_iter().find(|p| p.to_string() == s) {
            Some(purpose) => Ok(purpose),
            None => tracerr!(Err::InvalidInput, "unknown key purpose: {s}"),
        }
    }
}
