//! Request and response bodies of the registry API. Field names follow the registry's camelCase
//! JSON.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Every registry response is wrapped in this envelope. Code `"0"` means success.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope {
    pub code: String,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub message: String,
}

// ---- DID ----

/// Register a DID document.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDidRequest {
    /// Registry project.
    pub project_no: String,
    /// The DID document as a JSON string.
    pub did_document: String,
    /// Signature over the document.
    pub signature: String,
    /// Optional transaction signature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_signature: Option<String>,
}

/// Look up a DID document.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDidRequest {
    /// DID to look up.
    pub did: String,
    /// Registry project.
    pub project_no: String,
}

/// A DID document held by the registry.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DidDocumentRecord {
    /// The DID document as a JSON string.
    pub did_document: String,
}

/// Replace a registered DID document.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDidRequest {
    /// Registry project.
    pub project_no: String,
    /// The new DID document as a JSON string.
    pub did_document: String,
    /// Index of the key that signed the update.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    /// Signature over the document.
    pub signature: String,
    /// Optional transaction signature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_signature: Option<String>,
}

// ---- Issuer ----

/// A credential issuer.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Issuer {
    /// Issuer DID.
    pub issuer_did: String,
    /// Display name.
    pub issuer_name: String,
}

/// Register a credential issuer.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterIssuerRequest {
    /// Issuer DID.
    pub issuer_did: String,
    /// Display name.
    pub issuer_name: String,
    /// Registry project.
    pub project_no: String,
    /// Contact name.
    pub contact_person: String,
    /// Contact phone number.
    pub contact_number: String,
    /// Contact email address.
    pub contact_email: String,
    /// What the issuer issues credentials for.
    pub business_scenario: String,
    /// Signature over the request.
    pub signature: String,
    /// Optional transaction signature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_signature: Option<String>,
}

/// Look up an issuer.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryIssuerRequest {
    /// Issuer DID.
    pub issuer_did: String,
}

/// Change an issuer's name.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateIssuerRequest {
    /// Issuer DID.
    pub issuer_did: String,
    /// New display name.
    pub issuer_name: String,
    /// Signature over the request.
    pub signature: String,
    /// Optional transaction signature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_signature: Option<String>,
}

/// Enable or disable an issuer.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuerStatusRequest {
    /// Issuer DID.
    pub issuer_did: String,
    /// Registry project.
    pub project_no: String,
}

// ---- VC templates ----

/// Proof attached to a credential template.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    /// When the proof was created.
    pub created: String,
    /// Proof type.
    #[serde(rename = "type")]
    pub type_: String,
    /// Verification method used.
    pub verification_method: String,
    /// Cryptographic suite.
    pub cryptosuite: String,
    /// Purpose of the proof.
    pub proof_purpose: String,
    /// Proof value.
    pub proof_value: String,
}

/// A field the holder supplies when applying for a credential.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationField {
    /// Field name.
    pub field_name: String,
    /// Field description.
    pub description: String,
    /// Whether the field must be supplied.
    pub mandatory: bool,
}

/// A claim the credential makes about its subject.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSubject {
    /// Claim name.
    pub subject_name: String,
    /// Claim description.
    pub description: String,
}

/// Verifiable credential template.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VcTemplate {
    /// Template ID. See [`crate::generate_vc_template_id`].
    pub template_id: String,
    /// Template name.
    pub template_name: String,
    /// Template description.
    pub template_description: String,
    /// Where holders apply for credentials.
    pub issuance_endpoint: String,
    /// Issuer DID.
    pub issuer_did: String,
    /// Fields supplied by holders.
    pub registration_fields: Vec<RegistrationField>,
    /// Claims made by credentials.
    pub credential_subjects: Vec<CredentialSubject>,
    /// Issuer's proof over the template.
    pub proof: Proof,
}

/// Register a credential template.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterVcTemplateRequest {
    /// Issuer DID.
    pub issuer_did: String,
    /// Registry project.
    pub project_no: String,
    /// The template.
    pub vc_template: VcTemplate,
    /// Signature over the request.
    pub signature: String,
    /// Optional transaction signature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_signature: Option<String>,
}

/// Look up a credential template.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryVcTemplateRequest {
    /// Registry project.
    pub project_no: String,
    /// Template ID.
    pub vc_template_id: String,
}

/// A credential template held by the registry.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VcTemplateRecord {
    /// The template as a JSON string.
    pub vc_template: String,
}

// ---- VCs ----

/// W3C verifiable credential. See <https://www.w3.org/TR/vc-data-model/>
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiableCredential {
    /// JSON-LD contexts.
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    /// Credential ID.
    pub id: String,
    /// Credential types.
    #[serde(rename = "type")]
    pub type_: Vec<String>,
    /// Issuer DID.
    pub issuer: String,
    /// Issuance date.
    pub issuance_date: String,
    /// Expiration date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
    /// Claims about the subject.
    pub credential_subject: Map<String, Value>,
    /// Schema the credential conforms to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_schema: Option<Value>,
    /// Issuer's proof.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<Value>,
}

/// Issue a credential from a template.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueVcRequest {
    /// Registry project.
    pub project_no: String,
    /// Template the credential is issued from.
    pub vc_template_id: String,
    /// The credential.
    pub vc: VerifiableCredential,
    /// Signature over the request.
    pub signature: String,
    /// Optional transaction signature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_signature: Option<String>,
}

/// Record evidence of an issued credential.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VcEvidenceRequest {
    /// Credential ID.
    pub vc_id: String,
    /// Registry project.
    pub project_no: String,
    /// Hash of the credential.
    pub vc_hash: String,
    /// Issuer DID.
    pub issuer_did: String,
    /// Signature over the request.
    pub signature: String,
    /// Optional transaction signature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_signature: Option<String>,
}

/// Identify a credential: used to query evidence and revocation status.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VcLookupRequest {
    /// Credential ID.
    pub vc_id: String,
    /// Registry project.
    pub project_no: String,
    /// Issuer DID.
    pub issuer_did: String,
}

/// Evidence recorded for a credential.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VcEvidence {
    /// Credential ID.
    pub vc_id: String,
    /// Hash of the credential.
    pub vc_hash: String,
    /// Issuer DID.
    pub issuer_did: String,
    /// Ledger transaction hash.
    pub tx_hash: String,
}

/// Revoke or verify a credential.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VcRequest {
    /// Registry project.
    pub project_no: String,
    /// The credential as a JSON string.
    pub vc: String,
}

// ---- VPs ----

/// W3C verifiable presentation: credentials bundled by their holder.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiablePresentation {
    /// JSON-LD contexts.
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    /// Presentation ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Presentation types.
    #[serde(rename = "type")]
    pub type_: Vec<String>,
    /// Holder DID.
    pub holder: String,
    /// Presented credentials.
    #[serde(default)]
    pub verifiable_credential: Vec<VerifiableCredential>,
    /// Holder's proof.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<Value>,
}

/// Have the registry build and sign a presentation for a holder.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVpRequest {
    /// Holder DID.
    pub holder_did: String,
    /// Credentials to present.
    pub verifiable_credential: Vec<VerifiableCredential>,
    /// Verifier's challenge, bound into the proof.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
    /// Verifier's domain, bound into the proof.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Holder's signature over the request.
    pub signature: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RevokeStatus {
    pub revoke_status: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VerificationStatus {
    pub verification_status: bool,
}
