//! Cryptographic key types, key-pair generation and the key-manager capability traits.

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Err, Error};
use crate::{tracerr, Result};

pub mod keypair;
pub mod manager;

/// Asymmetric algorithms supported by the key-pair generator and the signature engine.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Algorithm {
    /// ECDSA over secp256k1.
    #[default]
    #[serde(rename = "ECDSA")]
    Ecdsa,
    /// RSA with a 2048-bit modulus.
    #[serde(rename = "RSA")]
    Rsa,
    /// SM2. Compatibility mode: keys are generated on NIST P-256, not the SM2 curve.
    #[serde(rename = "SM2")]
    Sm2,
}

impl Algorithm {
    /// The verification method type registered for keys of this algorithm.
    ///
    /// SM2 shares the secp256k1 type tag. This is a known gap: no registered type exists for the
    /// compatibility-mode keys.
    #[must_use]
    pub const fn verification_method_type(&self) -> &'static str {
        match self {
            Self::Ecdsa | Self::Sm2 => "EcdsaSecp256k1VerificationKey2019",
            Self::Rsa => "RsaVerificationKey2018",
        }
    }
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ecdsa => write!(f, "ECDSA"),
            Self::Rsa => write!(f, "RSA"),
            Self::Sm2 => write!(f, "SM2"),
        }
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "" => tracerr!(Err::InvalidInput, "algorithm cannot be empty"),
            "ECDSA" => Ok(Self::Ecdsa),
            "RSA" => Ok(Self::Rsa),
            "SM2" => Ok(Self::Sm2),
            _ => tracerr!(Err::UnsupportedAlgorithm, "unsupported algorithm: {s}"),
        }
    }
}

/// Key types a key manager can hold.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum KeyType {
    /// Ed25519 signing key.
    #[serde(rename = "ED25519")]
    Ed25519,
    /// ECDSA over NIST P-256.
    #[serde(rename = "ECDSAP256")]
    EcdsaP256,
    /// RSA with a 2048-bit modulus.
    #[serde(rename = "RSA2048")]
    Rsa2048,
    /// SM2, in P-256 compatibility mode.
    #[serde(rename = "SM2")]
    Sm2,
}

impl Display for KeyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ed25519 => write!(f, "ED25519"),
            Self::EcdsaP256 => write!(f, "ECDSAP256"),
            Self::Rsa2048 => write!(f, "RSA2048"),
            Self::Sm2 => write!(f, "SM2"),
        }
    }
}

/// Simplified JSON Web Key (JWK) public key structure.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct Jwk {
    /// Key type.
    pub kty: String,
    /// Cryptographic curve type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
    /// X coordinate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    /// Y coordinate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    /// RSA modulus.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    /// RSA public exponent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
}

impl Jwk {
    /// Build a JWK from the JSON form produced by the `elliptic-curve` crates.
    pub(crate) fn from_ec_json(json: &str) -> Result<Self> {
        match serde_json::from_str(json) {
            Ok(jwk) => Ok(jwk),
            Err(e) => tracerr!(Err::EncodingError, "unable to read EC JWK: {e}"),
        }
    }
}
