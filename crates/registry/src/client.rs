use std::time::Duration;

use did_core::error::Err;
use did_core::{tracerr, Config, ProjectVisibility, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::types::{
    DidDocumentRecord, Envelope, GenerateVpRequest, IssueVcRequest, Issuer, IssuerStatusRequest,
    QueryDidRequest, QueryIssuerRequest, QueryVcTemplateRequest, RegisterDidRequest,
    RegisterIssuerRequest, RegisterVcTemplateRequest, RevokeStatus, UpdateDidRequest,
    UpdateIssuerRequest, VcEvidence, VcEvidenceRequest, VcLookupRequest, VcRequest,
    VcTemplateRecord, VerifiablePresentation, VerificationStatus,
};

const SUCCESS: &str = "0";

/// Client for the DID registry API.
#[derive(Clone, Debug)]
pub struct RegistryClient {
    base_url: String,
    token: Option<String>,
    http_client: reqwest::Client,
}

impl RegistryClient {
    /// Create a client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Registry API base URL.
    /// * `token` - Access token, required for private projects. Sent as a bearer token and in
    ///   the `token` header.
    /// * `timeout` - Deadline for each call.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidConfig` - The base URL is not valid or the HTTP client cannot be created.
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        if let Err(e) = url::Url::parse(base_url) {
            tracerr!(Err::InvalidConfig, "invalid registry URL {base_url}: {e}");
        }
        let http_client = match reqwest::Client::builder().timeout(timeout).build() {
            Ok(client) => client,
            Err(e) => tracerr!(Err::InvalidConfig, "failed to create HTTP client: {e}"),
        };
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
            http_client,
        })
    }

    /// Create a client from SDK configuration. The token is only used for private projects.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidConfig` - The configuration is not valid.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let token = match config.project_visibility {
            ProjectVisibility::Private => config.token.clone(),
            ProjectVisibility::Public => None,
        };
        Self::new(&config.registry_endpoint, token, config.timeout())
    }

    // POST a request and unwrap the response envelope.
    async fn post<T: DeserializeOwned>(&self, path: &str, body: &impl Serialize) -> Result<T> {
        let url = format!("{}{path}", self.base_url);
        let mut request = self.http_client.post(&url).json(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token).header("token", token);
        }

        tracing::info!("registry call {path}");
        let response = match request.send().await {
            Ok(res) => res,
            Err(e) if e.is_timeout() => tracerr!(Err::Timeout, "registry call {path} timed out"),
            Err(e) => tracerr!(Err::RequestError, "registry call {path} failed: {e}"),
        };

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            tracerr!(Err::RequestError, "registry call {path} returned {status}: {body}");
        }

        let envelope = match response.json::<Envelope>().await {
            Ok(envelope) => envelope,
            Err(e) if e.is_timeout() => tracerr!(Err::Timeout, "registry call {path} timed out"),
            Err(e) => tracerr!(Err::DeserializationError, "invalid registry response: {e}"),
        };
        if envelope.code != SUCCESS {
            tracerr!(
                Err::ProviderError,
                "registry rejected {path}: code {}, message: {}",
                envelope.code,
                envelope.message
            );
        }

        match serde_json::from_value(envelope.data.unwrap_or(Value::Null)) {
            Ok(data) => Ok(data),
            Err(e) => tracerr!(Err::DeserializationError, "unexpected data from {path}: {e}"),
        }
    }

    /// Register a DID document.
    ///
    /// # Errors
    ///
    /// * `Err::ProviderError` - The registry rejected the request.
    /// * `Err::RequestError` - The request failed or the registry returned an HTTP error.
    /// * `Err::Timeout` - The registry did not answer in time.
    pub async fn register_did(&self, request: &RegisterDidRequest) -> Result<Value> {
        self.post("/api/sys/v1/did/register", request).await
    }

    /// Look up a DID document, returned as the registry holds it: a JSON string.
    ///
    /// # Errors
    ///
    /// As for [`Self::register_did`].
    pub async fn query_did(&self, request: &QueryDidRequest) -> Result<String> {
        let record: DidDocumentRecord = self.post("/api/sys/v1/did/search", request).await?;
        Ok(record.did_document)
    }

    /// Replace a registered DID document.
    ///
    /// # Errors
    ///
    /// As for [`Self::register_did`].
    pub async fn update_did(&self, request: &UpdateDidRequest) -> Result<Value> {
        self.post("/api/sys/v1/did/update", request).await
    }

    /// Register a credential issuer.
    ///
    /// # Errors
    ///
    /// As for [`Self::register_did`].
    pub async fn register_issuer(&self, request: &RegisterIssuerRequest) -> Result<Value> {
        self.post("/api/sys/v1/issuer/register", request).await
    }

    /// Look up an issuer.
    ///
    /// # Errors
    ///
    /// As for [`Self::register_did`].
    pub async fn query_issuer(&self, request: &QueryIssuerRequest) -> Result<Issuer> {
        self.post("/api/sys/v1/issuer/search", request).await
    }

    /// Change an issuer's name.
    ///
    /// # Errors
    ///
    /// As for [`Self::register_did`].
    pub async fn update_issuer(&self, request: &UpdateIssuerRequest) -> Result<Value> {
        self.post("/api/sys/v1/issuer/update", request).await
    }

    /// Enable or disable an issuer.
    ///
    /// # Errors
    ///
    /// As for [`Self::register_did`].
    pub async fn issuer_status(&self, request: &IssuerStatusRequest) -> Result<Value> {
        self.post("/api/sys/v1/issuer/status/update", request).await
    }

    /// Register a credential template.
    ///
    /// # Errors
    ///
    /// As for [`Self::register_did`].
    pub async fn register_vc_template(&self, request: &RegisterVcTemplateRequest) -> Result<Value> {
        self.post("/api/sys/v1/vc/register", request).await
    }

    /// Look up a credential template, returned as a JSON string.
    ///
    /// # Errors
    ///
    /// As for [`Self::register_did`].
    pub async fn query_vc_template(&self, request: &QueryVcTemplateRequest) -> Result<String> {
        let record: VcTemplateRecord = self.post("/api/sys/v1/vc/search", request).await?;
        Ok(record.vc_template)
    }

    /// Issue a credential.
    ///
    /// # Errors
    ///
    /// As for [`Self::register_did`].
    pub async fn issue_vc(&self, request: &IssueVcRequest) -> Result<Value> {
        self.post("/api/sys/v1/vc/issue", request).await
    }

    /// Record evidence of an issued credential.
    ///
    /// # Errors
    ///
    /// As for [`Self::register_did`].
    pub async fn vc_evidence(&self, request: &VcEvidenceRequest) -> Result<Value> {
        self.post("/api/sys/v1/vc/evidence", request).await
    }

    /// Look up the evidence recorded for a credential.
    ///
    /// # Errors
    ///
    /// As for [`Self::register_did`].
    pub async fn query_vc_evidence(&self, request: &VcLookupRequest) -> Result<VcEvidence> {
        self.post("/api/sys/v1/vc/evidence/search", request).await
    }

    /// Revoke a credential.
    ///
    /// # Errors
    ///
    /// As for [`Self::register_did`].
    pub async fn vc_revoke(&self, request: &VcRequest) -> Result<Value> {
        self.post("/api/sys/v1/vc/revoke", request).await
    }

    /// Whether a credential has been revoked.
    ///
    /// # Errors
    ///
    /// As for [`Self::register_did`].
    pub async fn vc_revoke_status(&self, request: &VcLookupRequest) -> Result<bool> {
        let status: RevokeStatus = self.post("/api/sys/v1/vc/status/search", request).await?;
        Ok(status.revoke_status)
    }

    /// Ask the registry to verify a credential.
    ///
    /// # Errors
    ///
    /// As for [`Self::register_did`].
    pub async fn vc_verify(&self, request: &VcRequest) -> Result<bool> {
        let status: VerificationStatus = self.post("/api/sys/v1/vc/verify", request).await?;
        Ok(status.verification_status)
    }

    /// Have the registry build a presentation of the holder's credentials.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidInput` - The project ID is empty or not a single path segment.
    ///
    /// Otherwise as for [`Self::register_did`].
    pub async fn generate_vp(
        &self, project_id: &str, request: &GenerateVpRequest,
    ) -> Result<VerifiablePresentation> {
        self.post(&vp_path(project_id, "generate")?, request).await
    }

    /// Ask the registry to verify a presentation.
    ///
    /// # Errors
    ///
    /// As for [`Self::generate_vp`].
    pub async fn verify_vp(
        &self, project_id: &str, presentation: &VerifiablePresentation,
    ) -> Result<bool> {
        let status: VerificationStatus =
            self.post(&vp_path(project_id, "verify")?, presentation).await?;
        Ok(status.verification_status)
    }
}

// Presentation calls are scoped by project in the path rather than the body.
fn vp_path(project_id: &str, action: &str) -> Result<String> {
    if project_id.is_empty() || project_id.contains(['/', '?', '#']) {
        tracerr!(Err::InvalidInput, "invalid project ID '{project_id}'");
    }
    Ok(format!("/v1/vp/{project_id}/{action}"))
}

/// A fresh credential template ID (UUID v4).
#[must_use]
pub fn generate_vc_template_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
