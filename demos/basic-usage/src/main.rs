//! Walk through the SDK: keys, identifiers, DID documents, hashing, signing, encryption and the
//! in-process key manager.
//!
//! ```sh
//! RUST_LOG=debug cargo run -p basic-usage
//! ```

use anyhow::Result;
use sbp_did::hashing::compute_hash;
use sbp_did::keyring::LocalKeyManager;
use sbp_did::{
    decrypt, derive_identifier, encrypt, sign, verify, verification_method_from_manager,
    Algorithm, Config, Crypto, DidDocument, HashAlgorithm, KeyManager, KeyPair, KeyPurpose,
    KeyType, Service, VerificationMethod,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().unwrap_or_else(|e| {
        eprintln!("using default configuration: {e}");
        Config::default()
    });
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    tracing::info!("DID method {}, project '{}'", config.did_method, config.project_id);

    let did = documents(&config)?;
    hashing()?;
    signing()?;
    encryption()?;
    key_manager(&did).await?;
    Ok(())
}

// Generate a key pair, derive its identifier and assemble, change and print its document.
fn documents(config: &Config) -> Result<String> {
    println!("== DID documents ==");
    let keys = KeyPair::generate(Algorithm::Ecdsa, "primary")?;
    println!("public key:  {}", keys.public_key_hex()?);

    let did = derive_identifier(&keys, &config.did_method)?;
    println!("identifier:  {did}");

    let attributes = [
        ("organization".to_string(), json!("Example Corp")),
        ("region".to_string(), json!("APAC")),
    ];
    let mut document = DidDocument::assemble(&keys, Algorithm::Ecdsa, &did, attributes)?;

    let backup = KeyPair::generate(Algorithm::Ecdsa, "backup")?;
    let method = VerificationMethod::from_public_key(&backup, Algorithm::Ecdsa, &did, "keys-2")?;
    document.add_key(method, &[KeyPurpose::CapabilityInvocation])?;
    document.add_service(Service {
        id: format!("{did}#registry"),
        type_: "DIDRegistry".to_string(),
        service_endpoint: "https://registry.example.com".to_string(),
    })?;

    println!("{}", String::from_utf8(document.to_json()?)?);

    document.remove_key(&format!("{did}#keys-2"));
    println!("methods after removing keys-2: {}", document.verification_methods().len());
    Ok(did)
}

fn hashing() -> Result<()> {
    println!("\n== Hashing ==");
    let data = b"Hello, World!";
    println!("SHA-256: {}", compute_hash(data, HashAlgorithm::Sha256)?);
    println!("SM3:     {}", compute_hash(data, HashAlgorithm::Sm3)?);
    Ok(())
}

fn signing() -> Result<()> {
    println!("\n== Signing ==");
    for algorithm in [Algorithm::Ecdsa, Algorithm::Sm2, Algorithm::Rsa] {
        let keys = KeyPair::generate(algorithm, "signer")?;
        let signature = sign(&keys, b"message to sign", algorithm)?;
        let signature = hex::decode(signature)?;
        let valid = verify(keys.public_key(), b"message to sign", &signature, algorithm)?;
        let tampered = verify(keys.public_key(), b"message to sigh", &signature, algorithm)?;
        println!("{algorithm}: valid={valid} tampered={tampered}");
    }
    Ok(())
}

fn encryption() -> Result<()> {
    println!("\n== Encryption ==");
    let keys = KeyPair::generate(Algorithm::Rsa, "encryption")?;
    let ciphertext = encrypt(keys.public_key(), b"secret message", Algorithm::Rsa)?;
    let plaintext = decrypt(&keys, &hex::decode(&ciphertext)?, Algorithm::Rsa)?;
    println!("RSA-OAEP: {} bytes of ciphertext", ciphertext.len() / 2);
    println!("decrypted: {}", String::from_utf8(plaintext)?);
    Ok(())
}

// Hold keys in the in-process key manager and publish one in the document.
async fn key_manager(did: &str) -> Result<()> {
    println!("\n== Key manager ==");
    let manager = LocalKeyManager::new();

    let (key_id, _) = manager.create(KeyType::Ed25519).await?;
    let signature = manager.sign(&key_id, b"managed message").await?;
    let verified = manager.verify(&key_id, b"managed message", &signature).await?;
    println!("{key_id}: verified={verified}");

    let method = verification_method_from_manager(did, &key_id, &manager).await?;
    println!("verification method: {}", serde_json::to_string_pretty(&method)?);

    let (rsa_id, _) = manager.create(KeyType::Rsa2048).await?;
    let ciphertext = manager.encrypt(&rsa_id, b"for the key holder").await?;
    let plaintext = manager.decrypt(&rsa_id, &ciphertext).await?;
    println!("{rsa_id}: decrypted={}", String::from_utf8(plaintext)?);

    println!("keys held: {}", manager.list().await?.len());
    manager.delete(&key_id).await?;
    manager.delete(&rsa_id).await?;
    println!("keys held after delete: {}", manager.list().await?.len());
    Ok(())
}
