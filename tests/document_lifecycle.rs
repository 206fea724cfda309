//! Tests for creating, changing and signing a `did:sbp` document through the SDK facade.

use sbp_did::error::Err;
use sbp_did::hashing::compute_hash;
use sbp_did::keyring::LocalKeyManager;
use sbp_did::{
    derive_identifier, sign, verification_method_from_manager, verify, Algorithm, Crypto,
    DidDocument, HashAlgorithm, KeyManager, KeyPair, KeyPurpose, KeyType,
};
use serde_json::json;

// A document assembled from a fresh key is self-consistent and survives a JSON round trip with
// its business attributes intact.
#[test]
fn assemble_and_parse() {
    let keys = KeyPair::generate(Algorithm::Ecdsa, "primary").expect("should generate");
    let did = derive_identifier(&keys, "did:sbp:").expect("should derive");
    assert!(did.starts_with("did:sbp:"));
    assert_eq!(did.len(), "did:sbp:".len() + 64);

    let attributes = [("organization".to_string(), json!("Example Corp"))];
    let document = DidDocument::assemble(&keys, Algorithm::Ecdsa, &did, attributes)
        .expect("should assemble");
    document.validate().expect("should be valid");

    let json = document.to_json().expect("should serialize");
    let parsed = DidDocument::from_json(&json).expect("should parse");
    assert_eq!(parsed, document);

    let value: serde_json::Value = serde_json::from_slice(&json).expect("json");
    assert_eq!(value["organization"], "Example Corp");
    assert_eq!(value["authentication"][0], format!("{did}#keys-1"));
}

// The canonical form of a document is signed with the primary key and verified with the public
// key from the document holder's key pair.
#[test]
fn sign_canonical_document() {
    let keys = KeyPair::generate(Algorithm::Rsa, "primary").expect("should generate");
    let did = derive_identifier(&keys, "did:sbp:").expect("should derive");
    let mut document =
        DidDocument::assemble(&keys, Algorithm::Rsa, &did, []).expect("should assemble");

    let canonical = document.to_canonical_json().expect("should canonicalize");
    let signature = sign(&keys, &canonical, Algorithm::Rsa).expect("should sign");
    let signature = hex::decode(signature).expect("hex");
    assert!(verify(keys.public_key(), &canonical, &signature, Algorithm::Rsa).expect("verify"));

    document.deactivate();
    let changed = document.to_canonical_json().expect("should canonicalize");
    assert!(!verify(keys.public_key(), &changed, &signature, Algorithm::Rsa).expect("verify"));
}

// Keys held by a key manager are published in a document and used to sign for it.
#[tokio::test]
async fn managed_keys() {
    let manager = LocalKeyManager::new();
    let (key_id, public_key) = manager.create(KeyType::EcdsaP256).await.expect("should create");

    let did = format!("did:sbp:{}", compute_hash(&public_key, HashAlgorithm::Sm3).expect("hash"));
    let mut document = DidDocument::new(&did).expect("should create");
    let method =
        verification_method_from_manager(&did, &key_id, &manager).await.expect("should build");
    document
        .add_key(method.clone(), &[KeyPurpose::AssertionMethod])
        .expect("should add key");
    assert_eq!(document.key_for(KeyPurpose::AssertionMethod).expect("key").id, method.id);

    let signature = manager.sign(&key_id, b"claim").await.expect("should sign");
    assert!(manager.verify(&key_id, b"claim", &signature).await.expect("should verify"));

    manager.delete(&key_id).await.expect("should delete");
    let err = manager.sign(&key_id, b"claim").await.expect_err("key is gone");
    assert!(err.is(Err::KeyNotFound));

    assert!(document.remove_key(&method.id));
    let err = document.key_for(KeyPurpose::AssertionMethod).expect_err("no key");
    assert!(err.is(Err::KeyNotFound));
}
