//! DID Document and its component data structures, with assembly from a public key, key
//! addition and removal, and JSON conversion.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, SubsecRound, Utc};
use olpc_cjson::CanonicalFormatter;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::service::{check_services, Service};
use crate::document::verification_method::{KeyPurpose, VerificationMethod};
use crate::error::Err;
use crate::identifier::validate_identifier;
use crate::keys::keypair::PublicKeySource;
use crate::{tracerr, Algorithm, Result};

pub mod service;
pub mod verification_method;

/// Base DID context.
pub const DID_CONTEXT: &str = "https://www.w3.org/ns/did/v1";
/// JSON Web Signature 2020 suite context.
pub const JWS_2020_CONTEXT: &str = "https://w3id.org/security/suites/jws-2020/v1";

const PRIMARY_KEY_FRAGMENT: &str = "keys-1";

// Top-level names used by the document itself. Custom fields cannot use them.
const RESERVED_FIELDS: [&str; 14] = [
    "@context",
    "id",
    "controller",
    "verificationMethod",
    "authentication",
    "assertionMethod",
    "keyAgreement",
    "capabilityInvocation",
    "capabilityDelegation",
    "service",
    "alsoKnownAs",
    "created",
    "updated",
    "deactivated",
];

/// A DID is associated with a DID document that can be serialized into a representation of the DID.
/// https://www.w3.org/TR/did-core/
///
/// Every ID in a verification relationship list refers to a method in the verification method
/// list. The lists are only changed through [`DidDocument::add_key`] and
/// [`DidDocument::remove_key`], which keep that invariant.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DidDocument {
    /// JSON-LD contexts.
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    /// The DID the document describes.
    pub id: String,
    /// The DID of the entity authorized to make changes to the document.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub controller: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    verification_method: Vec<VerificationMethod>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    authentication: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    assertion_method: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    key_agreement: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    capability_invocation: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    capability_delegation: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    service: Vec<Service>,
    /// Other identifiers for the DID subject.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub also_known_as: Vec<String>,
    /// Creation time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    /// Time of the last change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
    /// Whether the DID has been deactivated.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub deactivated: bool,
    #[serde(skip)]
    custom_fields: BTreeMap<String, Value>,
}

impl DidDocument {
    /// An empty document for `id`, controlled by itself, with the default contexts.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidInput` - `id` is not a valid identifier.
    pub fn new(id: &str) -> Result<Self> {
        validate_identifier(id)?;
        let now = now();
        Ok(Self {
            context: vec![DID_CONTEXT.to_string(), JWS_2020_CONTEXT.to_string()],
            id: id.to_string(),
            controller: id.to_string(),
            created: Some(now),
            updated: Some(now),
            ..Self::default()
        })
    }

    /// Assemble a document for a single public key.
    ///
    /// The key becomes verification method `<identifier>#keys-1`, referenced from
    /// `authentication` and `assertionMethod`. Business attributes are carried as custom
    /// top-level fields.
    ///
    /// # Arguments
    ///
    /// * `public_key` - A key pair, public key bytes, or a hex string of the bytes.
    /// * `algorithm` - Algorithm of the key. Determines the verification method type.
    /// * `identifier` - The DID the document describes.
    /// * `business_attributes` - Custom fields to add to the document.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidInput` - The identifier is malformed, the key is empty, or an attribute name
    ///   collides with a document field.
    /// * `Err::InvalidKey` - A key pair of a different algorithm was supplied.
    pub fn assemble<'a>(
        public_key: impl Into<PublicKeySource<'a>>, algorithm: Algorithm, identifier: &str,
        business_attributes: impl IntoIterator<Item = (String, Value)>,
    ) -> Result<Self> {
        let mut doc = Self::new(identifier)?;
        for (name, value) in business_attributes {
            doc.set_custom_field(name, value)?;
        }

        let method = VerificationMethod::from_public_key(
            public_key,
            algorithm,
            identifier,
            PRIMARY_KEY_FRAGMENT,
        )?;
        doc.add_key(method, &[KeyPurpose::Authentication, KeyPurpose::AssertionMethod])?;

        tracing::debug!("assembled DID document for {identifier}");
        Ok(doc)
    }

    /// Assemble a document that publishes several keys.
    ///
    /// Methods keep their order. `authentication` and `assertion` name the methods referenced
    /// for each purpose.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidInput` - The identifier is malformed, a method is malformed, two methods
    ///   share an ID, or a reference names a method not in `methods`.
    pub fn assemble_multi_key(
        identifier: &str, methods: Vec<VerificationMethod>, authentication: &[String],
        assertion: &[String],
    ) -> Result<Self> {
        let mut doc = Self::new(identifier)?;
        for vm in &methods {
            vm.check()?;
        }
        tracing::debug!("assembling DID document for {identifier} with {} keys", methods.len());
        doc.verification_method = methods;
        doc.authentication = authentication.to_vec();
        doc.assertion_method = assertion.to_vec();
        doc.check_method_ids()?;
        doc.check_references()?;
        Ok(doc)
    }

    /// Verification methods, in insertion order.
    #[must_use]
    pub fn verification_methods(&self) -> &[VerificationMethod] {
        &self.verification_method
    }

    /// The verification method with the given ID.
    #[must_use]
    pub fn verification_method(&self, id: &str) -> Option<&VerificationMethod> {
        self.verification_method.iter().find(|vm| vm.id == id)
    }

    /// Verification method IDs referenced for a purpose.
    #[must_use]
    pub fn references(&self, purpose: KeyPurpose) -> &[String] {
        match purpose {
            KeyPurpose::Authentication => &self.authentication,
            KeyPurpose::AssertionMethod => &self.assertion_method,
            KeyPurpose::KeyAgreement => &self.key_agreement,
            KeyPurpose::CapabilityInvocation => &self.capability_invocation,
            KeyPurpose::CapabilityDelegation => &self.capability_delegation,
        }
    }

    fn references_mut(&mut self, purpose: KeyPurpose) -> &mut Vec<String> {
        match purpose {
            KeyPurpose::Authentication => &mut self.authentication,
            KeyPurpose::AssertionMethod => &mut self.assertion_method,
            KeyPurpose::KeyAgreement => &mut self.key_agreement,
            KeyPurpose::CapabilityInvocation => &mut self.capability_invocation,
            KeyPurpose::CapabilityDelegation => &mut self.capability_delegation,
        }
    }

    /// The first verification method referenced for a purpose.
    ///
    /// # Errors
    ///
    /// * `Err::KeyNotFound` - No method is referenced for the purpose.
    pub fn key_for(&self, purpose: KeyPurpose) -> Result<&VerificationMethod> {
        let found = self.references(purpose).iter().find_map(|id| self.verification_method(id));
        match found {
            Some(vm) => Ok(vm),
            None => tracerr!(Err::KeyNotFound, "no key found for {purpose}"),
        }
    }

    /// Add a verification method and reference it from each of `usages`.
    ///
    /// The document is unchanged if an error is returned.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidInput` - The method ID is empty or already present, or the method carries
    ///   more than one public key encoding.
    pub fn add_key(&mut self, method: VerificationMethod, usages: &[KeyPurpose]) -> Result<()> {
        method.check()?;
        if self.verification_method(&method.id).is_some() {
            tracerr!(Err::InvalidInput, "verification method {} already exists", method.id);
        }

        for purpose in usages {
            let references = self.references_mut(*purpose);
            if !references.contains(&method.id) {
                references.push(method.id.clone());
            }
        }
        self.verification_method.push(method);
        self.touch();
        Ok(())
    }

    /// Remove a verification method and every reference to it. Removing an unknown ID is a
    /// no-op.
    ///
    /// Returns `true` if the document changed.
    pub fn remove_key(&mut self, key_id: &str) -> bool {
        let before = self.verification_method.len();
        self.verification_method.retain(|vm| vm.id != key_id);
        let mut changed = self.verification_method.len() != before;

        for purpose in KeyPurpose::ALL {
            let references = self.references_mut(purpose);
            let before = references.len();
            references.retain(|id| id != key_id);
            changed |= references.len() != before;
        }

        if changed {
            self.touch();
        }
        changed
    }

    /// Services, in insertion order.
    #[must_use]
    pub fn services(&self) -> &[Service] {
        &self.service
    }

    /// Add a service.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidInput` - The service ID is empty or already present, or the endpoint is not
    ///   a valid URL.
    pub fn add_service(&mut self, service: Service) -> Result<()> {
        if self.service.iter().any(|s| s.id == service.id) {
            tracerr!(Err::InvalidInput, "service {} already exists", service.id);
        }
        check_services(std::slice::from_ref(&service))?;
        self.service.push(service);
        self.touch();
        Ok(())
    }

    /// Remove a service by ID. Returns `true` if the document changed.
    pub fn remove_service(&mut self, service_id: &str) -> bool {
        let before = self.service.len();
        self.service.retain(|s| s.id != service_id);
        let changed = self.service.len() != before;
        if changed {
            self.touch();
        }
        changed
    }

    /// Mark the DID as deactivated.
    pub fn deactivate(&mut self) {
        self.deactivated = true;
        self.touch();
    }

    /// Custom top-level fields.
    #[must_use]
    pub const fn custom_fields(&self) -> &BTreeMap<String, Value> {
        &self.custom_fields
    }

    /// Set a custom top-level field.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidInput` - The name is empty or is used by the document itself.
    pub fn set_custom_field(&mut self, name: impl Into<String>, value: Value) -> Result<()> {
        let name = name.into();
        if name.is_empty() {
            tracerr!(Err::InvalidInput, "custom field name cannot be empty");
        }
        if RESERVED_FIELDS.contains(&name.as_str()) {
            tracerr!(Err::InvalidInput, "custom field '{name}' collides with a document field");
        }
        self.custom_fields.insert(name, value);
        Ok(())
    }

    /// Remove a custom top-level field, returning its value.
    pub fn remove_custom_field(&mut self, name: &str) -> Option<Value> {
        self.custom_fields.remove(name)
    }

    /// Check the document as a whole: identifier, contexts, verification methods, references and
    /// services.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidInput` - The first problem found.
    pub fn validate(&self) -> Result<()> {
        validate_identifier(&self.id)?;
        if !self.controller.is_empty() {
            validate_identifier(&self.controller)?;
        }
        if self.context.is_empty() {
            tracerr!(Err::InvalidInput, "document has no @context");
        }

        for vm in &self.verification_method {
            vm.check()?;
        }
        self.check_method_ids()?;
        self.check_references()?;
        check_services(&self.service)
    }

    fn check_method_ids(&self) -> Result<()> {
        let mut ids = HashSet::new();
        for vm in &self.verification_method {
            if !ids.insert(vm.id.as_str()) {
                tracerr!(Err::InvalidInput, "duplicate verification method {}", vm.id);
            }
        }
        Ok(())
    }

    fn check_references(&self) -> Result<()> {
        for purpose in KeyPurpose::ALL {
            for id in self.references(purpose) {
                if self.verification_method(id).is_none() {
                    tracerr!(Err::InvalidInput, "{purpose} references unknown method {id}");
                }
            }
        }
        Ok(())
    }

    /// Serialize to pretty-printed JSON, with custom fields merged in at the top level. Keys are
    /// sorted.
    ///
    /// # Errors
    ///
    /// * `Err::SerializationError` - The document could not be serialized.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        match serde_json::to_vec_pretty(&self.to_value()?) {
            Ok(json) => Ok(json),
            Err(e) => tracerr!(Err::SerializationError, "unable to serialize DID document: {e}"),
        }
    }

    /// Serialize to canonical JSON, for signing.
    ///
    /// # Errors
    ///
    /// * `Err::SerializationError` - The document could not be serialized (custom fields holding
    ///   floating-point numbers have no canonical form).
    pub fn to_canonical_json(&self) -> Result<Vec<u8>> {
        let value = self.to_value()?;
        let mut buf = Vec::new();
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, CanonicalFormatter::new());
        if let Err(e) = value.serialize(&mut ser) {
            tracerr!(Err::SerializationError, "unable to canonicalize DID document: {e}");
        }
        Ok(buf)
    }

    fn to_value(&self) -> Result<Value> {
        let mut map = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            Ok(_) => tracerr!(Err::SerializationError, "DID document is not a JSON object"),
            Err(e) => tracerr!(Err::SerializationError, "unable to serialize DID document: {e}"),
        };
        for (name, value) in &self.custom_fields {
            if map.contains_key(name) || RESERVED_FIELDS.contains(&name.as_str()) {
                tracing::warn!("custom field '{name}' collides with a document field, skipped");
                continue;
            }
            map.insert(name.clone(), value.clone());
        }
        Ok(Value::Object(map))
    }

    /// Parse a document from JSON. Unknown top-level keys become custom fields.
    ///
    /// # Errors
    ///
    /// * `Err::SerializationError` - The input is not a JSON object of the document's shape.
    /// * `Err::InvalidInput` - Two verification methods share an ID, or a verification
    ///   relationship references an unknown method.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let mut map = match serde_json::from_slice(data) {
            Ok(Value::Object(map)) => map,
            Ok(_) => tracerr!(Err::SerializationError, "DID document must be a JSON object"),
            Err(e) => tracerr!(Err::SerializationError, "invalid DID document JSON: {e}"),
        };

        let custom: Vec<String> =
            map.keys().filter(|k| !RESERVED_FIELDS.contains(&k.as_str())).cloned().collect();
        let custom_fields = custom
            .into_iter()
            .filter_map(|name| map.remove(&name).map(|value| (name, value)))
            .collect();

        let mut doc: Self = match serde_json::from_value(Value::Object(map)) {
            Ok(doc) => doc,
            Err(e) => tracerr!(Err::SerializationError, "invalid DID document: {e}"),
        };
        doc.custom_fields = custom_fields;
        doc.check_method_ids()?;
        doc.check_references()?;
        Ok(doc)
    }

    fn touch(&mut self) {
        self.updated = Some(now());
    }
}

fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}
