use std::sync::{Arc, Mutex};
use std::time::Duration;

use base64ct::{Base64UrlUnpadded, Encoding};
use did_core::error::Err;
use did_core::{tracerr, KeyType, Result};
use reqwest::{Response, StatusCode, Url};

use crate::auth::{AccessToken, AzureConfig};
use crate::key_bundle::{
    ApiErrorResponse, CreateKeyRequest, Deleted, KeyBundle, KeyList, KeyListItem,
    KeyOperationRequest, KeyOperationResult,
};

const API_VERSION: &str = "7.4";

/// Azure Key Vault client.
#[derive(Clone, Debug)]
pub struct KeyVault {
    /// Vault URL and credentials
    config: AzureConfig,
    /// Reusable HTTP client
    http_client: reqwest::Client,
    /// Deadline for each call
    timeout: Duration,
    /// Most recent access token
    token: Arc<Mutex<Option<AccessToken>>>,
}

/// Azure Key Vault client constructor and vault operation methods.
impl KeyVault {
    /// Constructor.
    ///
    /// # Arguments
    ///
    /// * `config` - Vault URL and service principal credentials.
    /// * `timeout` - Deadline for each call to the vault or the identity provider.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidConfig` - The HTTP client cannot be created.
    pub fn new(config: AzureConfig, timeout: Duration) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        let http_client =
            match reqwest::Client::builder().default_headers(headers).timeout(timeout).build() {
                Ok(client) => client,
                Err(e) => tracerr!(Err::InvalidConfig, "failed to create HTTP client: {e}"),
            };
        Ok(Self {
            config,
            http_client,
            timeout,
            token: Arc::new(Mutex::new(None)),
        })
    }

    /// A usable access token, from the cache when possible.
    async fn token(&self) -> Result<AccessToken> {
        {
            let cached = self.token.lock().expect("lock on token mutex failed");
            if let Some(token) = cached.as_ref().filter(|t| t.is_fresh()) {
                return Ok(token.clone());
            }
        }
        let token = AccessToken::fetch(&self.config, self.timeout).await?;
        *self.token.lock().expect("lock on token mutex failed") = Some(token.clone());
        Ok(token)
    }

    fn url(&self, path: &str) -> Result<Url> {
        let vault_url = self.config.vault_url.trim_end_matches('/');
        let mut url = Url::parse(&format!("{vault_url}/{path}"))?;
        url.query_pairs_mut().append_pair("api-version", API_VERSION);
        Ok(url)
    }

    /// Add a key to the key vault.
    ///
    /// # Arguments
    ///
    /// * `key_name` - Name of the key to add.
    /// * `key_type` - Type of key to create. Only `ECDSAP256` and `RSA2048` are supported.
    ///
    /// # Returns
    ///
    /// The [`KeyBundle`] created.
    ///
    /// # Errors
    ///
    /// * `Err::UnsupportedAlgorithm` if the vault cannot hold keys of the type.
    /// * `Err::RequestError` if the request to the underlying API fails.
    /// * `Err::Timeout` if the vault does not answer in time.
    /// * `Err::DeserializationError` if the response from the underlying API cannot be
    ///   deserialized.
    pub async fn create_key(&self, key_name: &str, key_type: KeyType) -> Result<KeyBundle> {
        let create_request = CreateKeyRequest::for_key_type(key_type)?;
        let token = self.token().await?;
        let url = self.url(&format!("keys/{key_name}/create"))?;

        let request = self.http_client.post(url).bearer_auth(token.as_str()).json(&create_request);
        unpack_response(send(request).await?).await
    }

    /// Get the latest version of a key from the vault.
    ///
    /// # Errors
    ///
    /// * `Err::KeyNotFound` if there is no such key.
    /// * `Err::RequestError` if the request to the underlying API fails.
    /// * `Err::Timeout` if the vault does not answer in time.
    pub async fn get_key(&self, key_name: &str) -> Result<KeyBundle> {
        let token = self.token().await?;
        let url = self.url(&format!("keys/{key_name}"))?;

        let request = self.http_client.get(url).bearer_auth(token.as_str());
        unpack_response(send(request).await?).await
    }

    /// List every key in the vault, following `nextLink` until the last page.
    ///
    /// # Errors
    ///
    /// * `Err::RequestError` if a request to the underlying API fails.
    /// * `Err::Timeout` if the vault does not answer in time.
    pub async fn list_keys(&self) -> Result<Vec<KeyListItem>> {
        let mut keys = Vec::new();
        let mut next = Some(self.url("keys")?);

        while let Some(url) = next.take() {
            let token = self.token().await?;
            let request = self.http_client.get(url).bearer_auth(token.as_str());
            let page = unpack_response::<KeyList>(send(request).await?).await?;
            keys.extend(page.value);
            if let Some(link) = page.next_link.filter(|l| !l.is_empty()) {
                next = Some(Url::parse(&link)?);
            }
        }
        Ok(keys)
    }

    /// Remove a key from the vault. The vault keeps the key in a soft-deleted state until its
    /// scheduled purge date.
    ///
    /// # Returns
    ///
    /// The [`Deleted`] key. If there is no such key, an error is returned.
    ///
    /// # Errors
    ///
    /// * `Err::KeyNotFound` if there is no such key.
    /// * `Err::RequestError` if the request to the underlying API fails.
    pub async fn delete_key(&self, key_name: &str) -> Result<Deleted> {
        let token = self.token().await?;
        let url = self.url(&format!("keys/{key_name}"))?;

        let request = self.http_client.delete(url).bearer_auth(token.as_str());
        unpack_response(send(request).await?).await
    }

    /// Sign a SHA-256 digest with a key from the vault.
    ///
    /// # Arguments
    ///
    /// * `key_name` - Name of the key to use for signing.
    /// * `algorithm` - JWS algorithm, e.g. `ES256` or `RS256`.
    /// * `digest` - SHA-256 digest of the message.
    ///
    /// # Returns
    ///
    /// The raw signature. For ECDSA this is `r` and `s` concatenated.
    ///
    /// # Errors
    ///
    /// * `Err::KeyNotFound` if there is no such key.
    /// * `Err::RequestError` if the request to the underlying API fails.
    pub async fn sign(&self, key_name: &str, algorithm: &str, digest: &[u8]) -> Result<Vec<u8>> {
        self.key_operation(key_name, "sign", algorithm, digest).await
    }

    /// Encrypt with a vault key.
    ///
    /// # Errors
    ///
    /// * `Err::KeyNotFound` if there is no such key.
    /// * `Err::RequestError` if the request to the underlying API fails.
    pub async fn encrypt(
        &self, key_name: &str, algorithm: &str, plaintext: &[u8],
    ) -> Result<Vec<u8>> {
        self.key_operation(key_name, "encrypt", algorithm, plaintext).await
    }

    /// Decrypt with a vault key.
    ///
    /// # Errors
    ///
    /// * `Err::KeyNotFound` if there is no such key.
    /// * `Err::RequestError` if the request to the underlying API fails.
    pub async fn decrypt(
        &self, key_name: &str, algorithm: &str, ciphertext: &[u8],
    ) -> Result<Vec<u8>> {
        self.key_operation(key_name, "decrypt", algorithm, ciphertext).await
    }

    async fn key_operation(
        &self, key_name: &str, operation: &str, algorithm: &str, value: &[u8],
    ) -> Result<Vec<u8>> {
        let token = self.token().await?;
        let url = self.url(&format!("keys/{key_name}/{operation}"))?;

        let body = KeyOperationRequest {
            alg: algorithm.to_string(),
            value: Base64UrlUnpadded::encode_string(value),
        };
        let request = self.http_client.post(url).bearer_auth(token.as_str()).json(&body);
        let result = unpack_response::<KeyOperationResult>(send(request).await?).await?;
        Ok(result.value)
    }
}

// Send a request, separating timeouts from other transport failures.
async fn send(request: reqwest::RequestBuilder) -> Result<Response> {
    match request.send().await {
        Ok(res) => Ok(res),
        Err(e) if e.is_timeout() => tracerr!(Err::Timeout, "vault request timed out: {e}"),
        Err(e) => tracerr!(Err::RequestError, "unable to make request: {e}"),
    }
}

// Helper to unpack any response from the Azure API.
async fn unpack_response<T>(res: Response) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let status = res.status();
    if status.is_success() {
        return match res.json::<T>().await {
            Ok(obj) => Ok(obj),
            Err(e) => tracerr!(Err::DeserializationError, "unable to deserialize response: {e}"),
        };
    }

    let detail = res.json::<ApiErrorResponse>().await.ok().map(|r| r.error);
    let (code, message) =
        detail.map_or_else(|| (String::new(), String::new()), |d| (d.code, d.message));

    if status == StatusCode::NOT_FOUND || code == "KeyNotFound" {
        tracerr!(Err::KeyNotFound, "key not found: {message}");
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        tracerr!(Err::AuthError, "vault refused access ({status}): {message}");
    }
    if code.is_empty() {
        tracerr!(Err::RequestError, "vault request failed with status {status}");
    }
    tracerr!(Err::ProviderError, "code: {code}, message: {message}")
}
