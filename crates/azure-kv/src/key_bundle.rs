//! Data types exchanged with the Azure Key Vault REST API.

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::serde::ts_seconds_option;
use chrono::{DateTime, Utc};
use did_core::error::Err;
use did_core::{tracerr, KeyType, Result};
use p256::pkcs8::EncodePublicKey;
use rsa::{BigUint, RsaPublicKey};
use serde::{Deserialize, Deserializer, Serialize};

/// Key types the vault is asked to create.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum JwkType {
    /// Elliptic Curve
    #[serde(rename = "EC")]
    Ec,
    /// RSA
    #[serde(rename = "RSA")]
    Rsa,
}

/// Key operations a vault key is created with.
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JwkOperation {
    /// Sign
    Sign,
    /// Verify
    Verify,
    /// Encrypt
    Encrypt,
    /// Decrypt
    Decrypt,
}

/// Elliptic curve names supported by the vault that this crate uses.
#[derive(Clone, Copy, Debug, Serialize)]
pub enum JwkCurve {
    /// NIST P-256
    #[serde(rename = "P-256")]
    P256,
}

/// Key creation request body.
#[derive(Debug, Serialize)]
pub(crate) struct CreateKeyRequest {
    pub kty: JwkType,
    pub key_ops: Vec<JwkOperation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crv: Option<JwkCurve>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_size: Option<u32>,
    pub attributes: SettableAttributes,
}

impl CreateKeyRequest {
    /// Request body for a new key of the given type.
    pub(crate) fn for_key_type(key_type: KeyType) -> Result<Self> {
        let request = match key_type {
            KeyType::EcdsaP256 => Self {
                kty: JwkType::Ec,
                key_ops: vec![JwkOperation::Sign, JwkOperation::Verify],
                crv: Some(JwkCurve::P256),
                key_size: None,
                attributes: SettableAttributes { enabled: true },
            },
            KeyType::Rsa2048 => Self {
                kty: JwkType::Rsa,
                key_ops: vec![
                    JwkOperation::Sign,
                    JwkOperation::Verify,
                    JwkOperation::Encrypt,
                    JwkOperation::Decrypt,
                ],
                crv: None,
                key_size: Some(2048),
                attributes: SettableAttributes { enabled: true },
            },
            KeyType::Ed25519 | KeyType::Sm2 => {
                tracerr!(Err::UnsupportedAlgorithm, "Azure Key Vault cannot hold {key_type} keys")
            }
        };
        Ok(request)
    }
}

/// Attributes that can be set when creating a key. (A subset of those available in the API).
#[derive(Debug, Serialize)]
pub(crate) struct SettableAttributes {
    pub enabled: bool,
}

/// Request body for the sign, encrypt and decrypt operations.
#[derive(Debug, Serialize)]
pub(crate) struct KeyOperationRequest {
    /// Algorithm
    pub alg: String,
    /// Digest, plaintext or ciphertext, base64url encoded.
    pub value: String,
}

/// Response to the sign, encrypt and decrypt operations.
#[derive(Debug, Deserialize)]
pub(crate) struct KeyOperationResult {
    /// Key identifier
    #[allow(dead_code)]
    pub kid: Option<String>,
    /// Result bytes.
    #[serde(deserialize_with = "deser_base64")]
    pub value: Vec<u8>,
}

/// Error body returned by the vault.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorDetail {
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// A vault key: its public half and its attributes.
#[derive(Debug, Deserialize)]
pub struct KeyBundle {
    /// Public key and identifier.
    pub key: JsonWebKey,
    /// Lifecycle attributes.
    pub attributes: KeyAttributes,
}

/// A soft-deleted vault key.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deleted {
    /// The key as it was before deletion.
    #[serde(flatten)]
    pub key_bundle: KeyBundle,
    /// Where to send a recover request.
    pub recovery_id: Option<String>,
    /// Deletion time.
    #[serde(rename = "deletedDate", with = "ts_seconds_option", default)]
    pub deleted: Option<DateTime<Utc>>,
    /// Time after which the vault purges the key.
    #[serde(with = "ts_seconds_option", default)]
    pub scheduled_purge_date: Option<DateTime<Utc>>,
}

/// Lifecycle attributes of a vault key. Times are Unix seconds on the wire.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyAttributes {
    /// Whether the key can be used.
    pub enabled: Option<bool>,
    /// Creation time.
    #[serde(with = "ts_seconds_option")]
    pub created: Option<DateTime<Utc>>,
    /// Time of the last change.
    #[serde(with = "ts_seconds_option")]
    pub updated: Option<DateTime<Utc>>,
    /// Soft-delete recovery level, eg. `Recoverable+Purgeable`.
    pub recovery_level: Option<String>,
}

/// Public half of a vault key in JWK form. Binary members are base64url on the wire.
#[derive(Debug, Default, Deserialize)]
pub struct JsonWebKey {
    /// Versioned key identifier, `<vault>/keys/<name>/<version>`.
    #[serde(rename = "kid")]
    pub id: Option<String>,
    /// `EC` or `RSA` (with `-HSM` suffix for HSM-backed keys).
    #[serde(rename = "kty")]
    pub key_type: String,
    /// Operations the key permits.
    pub key_ops: Option<Vec<String>>,
    /// Curve of an EC key.
    #[serde(rename = "crv")]
    pub curve_name: Option<String>,
    /// RSA modulus.
    #[serde(deserialize_with = "deser_base64_opt", default)]
    pub n: Option<Vec<u8>>,
    /// RSA public exponent.
    #[serde(deserialize_with = "deser_base64_opt", default)]
    pub e: Option<Vec<u8>>,
    /// EC x coordinate.
    #[serde(deserialize_with = "deser_base64_opt", default)]
    pub x: Option<Vec<u8>>,
    /// EC y coordinate.
    #[serde(deserialize_with = "deser_base64_opt", default)]
    pub y: Option<Vec<u8>>,
}

impl JsonWebKey {
    /// The SDK key type of this vault key.
    ///
    /// # Errors
    ///
    /// * `Err::UnsupportedAlgorithm` - The key is neither P-256 nor RSA.
    pub fn sdk_key_type(&self) -> Result<KeyType> {
        match (self.key_type.as_str(), self.curve_name.as_deref()) {
            ("EC" | "EC-HSM", Some("P-256")) => Ok(KeyType::EcdsaP256),
            ("RSA" | "RSA-HSM", _) => Ok(KeyType::Rsa2048),
            (kty, crv) => {
                tracerr!(Err::UnsupportedAlgorithm, "unsupported vault key: {kty} {crv:?}")
            }
        }
    }

    /// The public key as SPKI DER.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidKey` - Key components are missing or malformed.
    /// * `Err::UnsupportedAlgorithm` - The key is neither P-256 nor RSA.
    pub fn to_spki_der(&self) -> Result<Vec<u8>> {
        let der = match self.sdk_key_type()? {
            KeyType::EcdsaP256 => {
                let (Some(x), Some(y)) = (&self.x, &self.y) else {
                    tracerr!(Err::InvalidKey, "EC key is missing coordinates");
                };
                if x.len() != 32 || y.len() != 32 {
                    tracerr!(Err::InvalidKey, "EC key coordinates must be 32 bytes");
                }
                let sec1 = [&[0x04], x.as_slice(), y.as_slice()].concat();
                let public = match p256::PublicKey::from_sec1_bytes(&sec1) {
                    Ok(public) => public,
                    Err(e) => tracerr!(Err::InvalidKey, "invalid EC key: {e}"),
                };
                public.to_public_key_der()
            }
            _ => {
                let (Some(n), Some(e)) = (&self.n, &self.e) else {
                    tracerr!(Err::InvalidKey, "RSA key is missing modulus or exponent");
                };
                let n = BigUint::from_bytes_be(n);
                let e = BigUint::from_bytes_be(e);
                let public = match RsaPublicKey::new(n, e) {
                    Ok(public) => public,
                    Err(e) => tracerr!(Err::InvalidKey, "invalid RSA key: {e}"),
                };
                public.to_public_key_der()
            }
        };
        match der {
            Ok(doc) => Ok(doc.as_bytes().to_vec()),
            Err(e) => tracerr!(Err::EncodingError, "unable to encode public key: {e}"),
        }
    }
}

/// One page of a key listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct KeyList {
    #[serde(default)]
    pub value: Vec<KeyListItem>,
    pub next_link: Option<String>,
}

/// A key in a listing. Listings carry identifiers and attributes, not key material.
#[derive(Debug, Deserialize)]
pub struct KeyListItem {
    /// Unversioned key identifier, `<vault>/keys/<name>`.
    pub kid: String,
    /// Lifecycle attributes.
    #[serde(default)]
    pub attributes: KeyAttributes,
}

impl KeyListItem {
    /// The key name: the last segment of the key identifier.
    #[must_use]
    pub fn name(&self) -> &str {
        self.kid.trim_end_matches('/').rsplit('/').next().unwrap_or_default()
    }
}

fn decode_base64url<E: serde::de::Error>(encoded: &str) -> Result<Vec<u8>, E> {
    Base64UrlUnpadded::decode_vec(encoded.trim_end_matches('=')).map_err(E::custom)
}

fn deser_base64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    decode_base64url(&String::deserialize(deserializer)?)
}

fn deser_base64_opt<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<u8>>, D::Error> {
    Option::<String>::deserialize(deserializer)?.map(|s| decode_base64url(&s)).transpose()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn deserialize_key_bundle() {
        let serialized = json!({
            "key": {
                "kid": "https://sbp-test.vault.azure.net/keys/did-4399d1c7/4399d1c799db41f6b2cf9920c7d72f14",
                "kty": "EC",
                "key_ops": ["sign", "verify"],
                "crv": "P-256",
                "x": "axfR8uEsQkf4vOblY6RA8ncDfYEt6zOg9KE5RdiYwpY",
                "y": "T-NC4v4af5uO5-tKfA-eFivOM1drMV7Oy7ZAaDe_UfU"
            },
            "attributes": {
                "enabled": true,
                "created": 1697601096,
                "updated": 1697601096,
                "recoveryLevel": "Recoverable+Purgeable"
            }
        });
        let bundle: KeyBundle = serde_json::from_value(serialized).expect("should deserialize");
        assert_eq!(bundle.attributes.enabled, Some(true));
        assert_eq!(bundle.attributes.created.map(|d| d.timestamp()), Some(1_697_601_096));
        assert_eq!(bundle.key.sdk_key_type().expect("key type"), KeyType::EcdsaP256);

        let der = bundle.key.to_spki_der().expect("should convert");
        let jwk = did_core::spki_to_jwk(&der, KeyType::EcdsaP256).expect("should convert");
        assert_eq!(jwk.x.as_deref(), Some("axfR8uEsQkf4vOblY6RA8ncDfYEt6zOg9KE5RdiYwpY"));
    }

    #[test]
    fn deserialize_deleted_key_bundle() {
        let serialized = json!({
            "recoveryId": "https://sbp-test.vault.azure.net/deletedkeys/did-4399d1c7",
            "deletedDate": 1697669021,
            "scheduledPurgeDate": 1705445021,
            "key": {
                "kid": "https://sbp-test.vault.azure.net/keys/did-4399d1c7/4399d1c799db41f6b2cf9920c7d72f14",
                "kty": "RSA",
                "key_ops": ["sign", "verify", "encrypt", "decrypt"],
                "n": "AQAB",
                "e": "AQAB"
            },
            "attributes": {
                "enabled": false,
                "created": 1697601096,
                "updated": 1697601096,
                "recoveryLevel": "Recoverable+Purgeable"
            }
        });
        let deleted: Deleted = serde_json::from_value(serialized).expect("should deserialize");
        assert_eq!(deleted.deleted.map(|d| d.timestamp()), Some(1_697_669_021));
        assert_eq!(deleted.scheduled_purge_date.map(|d| d.timestamp()), Some(1_705_445_021));
        assert_eq!(deleted.key_bundle.key.key_type, "RSA");
        assert_eq!(deleted.key_bundle.attributes.enabled, Some(false));
    }

    #[test]
    fn list_item_name() {
        let item: KeyListItem = serde_json::from_value(json!({
            "kid": "https://sbp-test.vault.azure.net/keys/did-abc",
            "attributes": {"enabled": true}
        }))
        .expect("should deserialize");
        assert_eq!(item.name(), "did-abc");
    }

    #[test]
    fn unsupported_create() {
        let err = CreateKeyRequest::for_key_type(KeyType::Ed25519).expect_err("should fail");
        assert!(err.is(Err::UnsupportedAlgorithm));

        let request = CreateKeyRequest::for_key_type(KeyType::Rsa2048).expect("should build");
        let json = serde_json::to_value(&request).expect("should serialize");
        assert_eq!(json["kty"], "RSA");
        assert_eq!(json["key_size"], 2048);
        assert!(json.get("crv").is_none());
    }
}
