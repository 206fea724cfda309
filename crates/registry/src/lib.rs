//! # DID registry client
//!
//! Registers and resolves DID documents, credential issuers, credential templates and
//! credentials with the SBP registry, and has it build and verify presentations. Every call is a
//! JSON `POST`, under `/api/sys/v1` or, for presentations, `/v1/vp/<project>`. The
//! registry wraps its answers in a `{code, data, message}` envelope where code `"0"` is success.
//!
//! Non-zero codes surface as `ProviderError`, HTTP failures as `RequestError` and missed
//! deadlines as `Timeout`.

mod client;
mod types;

pub use client::{generate_vc_template_id, RegistryClient};
pub use types::{
    CredentialSubject, DidDocumentRecord, GenerateVpRequest, IssueVcRequest, Issuer,
    IssuerStatusRequest, Proof, QueryDidRequest, QueryIssuerRequest, QueryVcTemplateRequest,
    RegisterDidRequest, RegisterIssuerRequest, RegisterVcTemplateRequest, RegistrationField,
    UpdateDidRequest, UpdateIssuerRequest, VcEvidence, VcEvidenceRequest, VcLookupRequest,
    VcRequest, VcTemplate, VcTemplateRecord, VerifiableCredential, VerifiablePresentation,
};
