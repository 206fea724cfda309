//! Tests for the Azure Key Vault key manager against an in-process server that mimics the vault
//! REST API and the identity provider's token endpoint.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Form, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use azure_kv::{AzureConfig, AzureKeyManager, KeyVault};
use base64ct::{Base64UrlUnpadded, Encoding};
use did_core::error::Err;
use did_core::{Crypto, KeyManager, KeyType};
use p256::ecdsa::signature::hazmat::PrehashSigner;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, Pkcs1v15Sign, RsaPrivateKey};
use serde_json::{json, Value};
use sha2::Sha256;

const TOKEN: &str = "fake-access-token";

enum FakeKey {
    Ec(p256::SecretKey),
    Rsa(Box<RsaPrivateKey>),
}

struct FakeVault {
    base: String,
    keys: Mutex<BTreeMap<String, FakeKey>>,
    slow: bool,
}

type Reply = (StatusCode, Json<Value>);

impl FakeVault {
    fn bundle(&self, name: &str, key: &FakeKey) -> Value {
        let kid = format!("{}/keys/{name}/0123456789abcdef", self.base);
        let jwk = match key {
            FakeKey::Ec(secret) => {
                let point = secret.public_key().to_encoded_point(false);
                json!({
                    "kid": kid,
                    "kty": "EC",
                    "crv": "P-256",
                    "key_ops": ["sign", "verify"],
                    "x": Base64UrlUnpadded::encode_string(point.x().expect("x coordinate")),
                    "y": Base64UrlUnpadded::encode_string(point.y().expect("y coordinate")),
                })
            }
            FakeKey::Rsa(private) => json!({
                "kid": kid,
                "kty": "RSA",
                "key_ops": ["sign", "verify", "encrypt", "decrypt"],
                "n": Base64UrlUnpadded::encode_string(&private.n().to_bytes_be()),
                "e": Base64UrlUnpadded::encode_string(&private.e().to_bytes_be()),
            }),
        };
        json!({
            "key": jwk,
            "attributes": {"enabled": true, "created": 1_700_000_000, "updated": 1_700_000_000}
        })
    }
}

fn error(status: StatusCode, code: &str) -> Reply {
    (status, Json(json!({"error": {"code": code, "message": format!("{code} from fake vault")}})))
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"))
}

async fn token(Form(form): Form<HashMap<String, String>>) -> Reply {
    if form.get("client_secret").map(String::as_str) != Some("secret") {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "invalid_client"})));
    }
    (
        StatusCode::OK,
        Json(json!({"access_token": TOKEN, "token_type": "Bearer", "expires_in": 3600})),
    )
}

async fn list_keys(
    State(vault): State<Arc<FakeVault>>, headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Reply {
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    // one key per page so that every listing exercises nextLink
    let page: usize = query.get("page").and_then(|p| p.parse().ok()).unwrap_or_default();
    let keys = vault.keys.lock().expect("lock");
    let names: Vec<&String> = keys.keys().collect();

    let value: Vec<Value> = names
        .get(page)
        .map(|name| {
            json!({"kid": format!("{}/keys/{name}", vault.base), "attributes": {"enabled": true}})
        })
        .into_iter()
        .collect();
    let next_link = (page + 1 < names.len())
        .then(|| format!("{}/keys?api-version=7.4&page={}", vault.base, page + 1));

    (StatusCode::OK, Json(json!({"value": value, "nextLink": next_link})))
}

async fn get_key(
    State(vault): State<Arc<FakeVault>>, headers: HeaderMap, Path(name): Path<String>,
) -> Reply {
    if vault.slow {
        tokio::time::sleep(Duration::from_secs(2)).await;
    }
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let keys = vault.keys.lock().expect("lock");
    match keys.get(&name) {
        Some(key) => (StatusCode::OK, Json(vault.bundle(&name, key))),
        None => error(StatusCode::NOT_FOUND, "KeyNotFound"),
    }
}

async fn delete_key(
    State(vault): State<Arc<FakeVault>>, headers: HeaderMap, Path(name): Path<String>,
) -> Reply {
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let mut keys = vault.keys.lock().expect("lock");
    let Some(key) = keys.remove(&name) else {
        return error(StatusCode::NOT_FOUND, "KeyNotFound");
    };
    let mut deleted = vault.bundle(&name, &key);
    deleted["recoveryId"] = json!(format!("{}/deletedkeys/{name}", vault.base));
    deleted["deletedDate"] = json!(1_700_000_100);
    deleted["scheduledPurgeDate"] = json!(1_707_776_100);
    (StatusCode::OK, Json(deleted))
}

async fn key_operation(
    State(vault): State<Arc<FakeVault>>, headers: HeaderMap,
    Path((name, operation)): Path<(String, String)>, Json(body): Json<Value>,
) -> Reply {
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Unauthorized");
    }

    if operation == "create" {
        let key = match (body["kty"].as_str(), body["crv"].as_str()) {
            (Some("EC"), Some("P-256")) => {
                FakeKey::Ec(p256::SecretKey::random(&mut rand::rngs::OsRng))
            }
            (Some("RSA"), _) => FakeKey::Rsa(Box::new(
                RsaPrivateKey::new(&mut rand::rngs::OsRng, 2048).expect("RSA key"),
            )),
            _ => return error(StatusCode::BAD_REQUEST, "BadParameter"),
        };
        let bundle = vault.bundle(&name, &key);
        vault.keys.lock().expect("lock").insert(name, key);
        return (StatusCode::OK, Json(bundle));
    }

    let keys = vault.keys.lock().expect("lock");
    let Some(key) = keys.get(&name) else {
        return error(StatusCode::NOT_FOUND, "KeyNotFound");
    };
    let alg = body["alg"].as_str().unwrap_or_default();
    let Ok(value) = Base64UrlUnpadded::decode_vec(body["value"].as_str().unwrap_or_default())
    else {
        return error(StatusCode::BAD_REQUEST, "BadParameter");
    };

    let result = match (operation.as_str(), alg, key) {
        ("sign", "ES256", FakeKey::Ec(secret)) => {
            let signing_key = p256::ecdsa::SigningKey::from(secret);
            let sig: p256::ecdsa::Signature = signing_key.sign_prehash(&value).expect("sign");
            sig.to_bytes().to_vec()
        }
        ("sign", "RS256", FakeKey::Rsa(private)) => {
            private.sign(Pkcs1v15Sign::new::<Sha256>(), &value).expect("sign")
        }
        ("encrypt", "RSA-OAEP-256", FakeKey::Rsa(private)) => private
            .to_public_key()
            .encrypt(&mut rand::rngs::OsRng, Oaep::new::<Sha256>(), &value)
            .expect("encrypt"),
        ("decrypt", "RSA-OAEP-256", FakeKey::Rsa(private)) => {
            match private.decrypt(Oaep::new::<Sha256>(), &value) {
                Ok(plaintext) => plaintext,
                Err(_) => return error(StatusCode::BAD_REQUEST, "BadParameter"),
            }
        }
        _ => return error(StatusCode::BAD_REQUEST, "BadParameter"),
    };

    let kid = format!("{}/keys/{name}/0123456789abcdef", vault.base);
    (StatusCode::OK, Json(json!({"kid": kid, "value": Base64UrlUnpadded::encode_string(&result)})))
}

// Start a fake vault and return its base URL.
async fn start_vault(slow: bool) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("should bind");
    let base = format!("http://{}", listener.local_addr().expect("local address"));

    let vault = Arc::new(FakeVault {
        base: base.clone(),
        keys: Mutex::new(BTreeMap::new()),
        slow,
    });
    let app = Router::new()
        .route("/{tenant}/oauth2/v2.0/token", post(token))
        .route("/keys", get(list_keys))
        .route("/keys/{name}", get(get_key).delete(delete_key))
        .route("/keys/{name}/{operation}", post(key_operation))
        .with_state(vault);

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake vault should run");
    });
    base
}

fn config(base: &str, secret: &str) -> AzureConfig {
    let mut config = AzureConfig::new(base, "tenant", "client", secret);
    config.authority = base.to_string();
    config
}

fn key_manager(base: &str, prefix: &str) -> AzureKeyManager {
    let vault = KeyVault::new(config(base, "secret"), Duration::from_secs(10)).expect("client");
    AzureKeyManager::new(vault, prefix).expect("manager")
}

#[tokio::test]
async fn ec_key_lifecycle() {
    let base = start_vault(false).await;
    let manager = key_manager(&base, "did");

    let (key_id, public_key) = manager.create(KeyType::EcdsaP256).await.expect("should create");
    assert!(key_id.starts_with("did-"));
    assert_eq!(manager.get(&key_id).await.expect("should get"), public_key);
    assert_eq!(manager.key_type(&key_id).await.expect("key type"), KeyType::EcdsaP256);
    assert_eq!(manager.list().await.expect("should list"), vec![key_id.clone()]);

    let sig = manager.sign(&key_id, b"Hello, world!").await.expect("should sign");
    assert_eq!(sig[0], 0x30, "signature should be DER encoded");
    assert!(manager.verify(&key_id, b"Hello, world!", &sig).await.expect("should verify"));
    assert!(!manager.verify(&key_id, b"Hello, World!", &sig).await.expect("should verify"));

    manager.delete(&key_id).await.expect("should delete");
    let err = manager.get(&key_id).await.expect_err("key is gone");
    assert!(err.is(Err::KeyNotFound));
    let err = manager.sign(&key_id, b"data").await.expect_err("key is gone");
    assert!(err.is(Err::KeyNotFound));
}

#[tokio::test]
async fn rsa_sign_and_encrypt() {
    let base = start_vault(false).await;
    let manager = key_manager(&base, "did");

    let (key_id, _) = manager.create(KeyType::Rsa2048).await.expect("should create");
    let sig = manager.sign(&key_id, b"message").await.expect("should sign");
    assert_eq!(sig.len(), 256);
    assert!(manager.verify(&key_id, b"message", &sig).await.expect("should verify"));

    let ciphertext = manager.encrypt(&key_id, b"secret").await.expect("should encrypt");
    let plaintext = manager.decrypt(&key_id, &ciphertext).await.expect("should decrypt");
    assert_eq!(plaintext, b"secret");
}

#[tokio::test]
async fn other_key_does_not_verify() {
    let base = start_vault(false).await;
    let manager = key_manager(&base, "did");

    let (first, _) = manager.create(KeyType::EcdsaP256).await.expect("should create");
    let (second, _) = manager.create(KeyType::EcdsaP256).await.expect("should create");
    let sig = manager.sign(&first, b"message").await.expect("should sign");
    assert!(!manager.verify(&second, b"message", &sig).await.expect("should verify"));
}

#[tokio::test]
async fn list_follows_next_link() {
    let base = start_vault(false).await;
    let manager = key_manager(&base, "tenant-a");
    let other = key_manager(&base, "tenant-b");

    let mut created = Vec::new();
    for _ in 0..3 {
        created.push(manager.create(KeyType::EcdsaP256).await.expect("should create").0);
    }
    other.create(KeyType::EcdsaP256).await.expect("should create");

    let mut listed = manager.list().await.expect("should list");
    listed.sort();
    created.sort();
    assert_eq!(listed, created);
}

#[tokio::test]
async fn unsupported_operations() {
    let base = start_vault(false).await;
    let manager = key_manager(&base, "did");

    let err = manager.create(KeyType::Ed25519).await.expect_err("no Ed25519 in the vault");
    assert!(err.is(Err::UnsupportedAlgorithm));
    let err = manager.import_private_key(&[1, 2, 3], KeyType::EcdsaP256).await.expect_err("import");
    assert!(err.is(Err::UnsupportedOperation));

    let (key_id, _) = manager.create(KeyType::EcdsaP256).await.expect("should create");
    let err = manager.export_private_key(&key_id).await.expect_err("export");
    assert!(err.is(Err::UnsupportedOperation));
    let err = manager.encrypt(&key_id, b"data").await.expect_err("EC cannot encrypt");
    assert!(err.is(Err::UnsupportedOperation));
}

#[tokio::test]
async fn bad_credentials() {
    let base = start_vault(false).await;
    let vault = KeyVault::new(config(&base, "wrong"), Duration::from_secs(10)).expect("client");
    let manager = AzureKeyManager::new(vault, "did").expect("manager");

    let err = manager.create(KeyType::EcdsaP256).await.expect_err("should be refused");
    assert!(err.is(Err::AuthError));
}

#[tokio::test]
async fn slow_vault_times_out() {
    let base = start_vault(true).await;
    let vault = KeyVault::new(config(&base, "secret"), Duration::from_millis(300)).expect("client");
    let manager = AzureKeyManager::new(vault, "did").expect("manager");

    let err = manager.get("did-anything").await.expect_err("should time out");
    assert!(err.is(Err::Timeout));
}

#[test]
fn bad_prefix() {
    let vault = KeyVault::new(config("http://localhost", "secret"), Duration::from_secs(1))
        .expect("client");
    let err = AzureKeyManager::new(vault, "has space").expect_err("should fail");
    assert!(err.is(Err::InvalidConfig));
}
