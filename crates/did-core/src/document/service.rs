//! Services are used to express ways of communicating with the DID subject or associated entities,
//! such as a credential registry or a messaging endpoint.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::Err;
use crate::{tracerr, Result};

/// Service description.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Service {
    /// Identifier for the service. Must be unique for services within the DID document.
    pub id: String,
    /// The type of service.
    #[serde(rename = "type")]
    pub type_: String,
    /// Location of the service. Must be a valid URL.
    pub service_endpoint: String,
}

/// Check the services in a set conform to format constraints.
///
/// # Errors
///
/// - [`Err::InvalidInput`] if a service ID is empty or duplicated, or an endpoint is not a valid
///   URL.
pub fn check_services(services: &[Service]) -> Result<()> {
    let mut seen = HashSet::new();
    for s in services {
        if s.id.is_empty() {
            tracerr!(Err::InvalidInput, "service ID cannot be empty");
        }
        if !seen.insert(s.id.as_str()) {
            tracerr!(Err::InvalidInput, "duplicate service ID: {}", s.id);
        }
        if let Err(e) = url::Url::parse(&s.service_endpoint) {
            tracerr!(Err::InvalidInput, "invalid endpoint for service {}: {e}", s.id);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(id: &str, endpoint: &str) -> Service {
        Service {
            id: id.to_string(),
            type_: "CredentialRegistry".to_string(),
            service_endpoint: endpoint.to_string(),
        }
    }

    #[test]
    fn valid_services() {
        let services = [
            service("did:sbp:abc#registry", "https://registry.example.com"),
            service("did:sbp:abc#hub", "https://hub.example.com/v1"),
        ];
        check_services(&services).expect("services should be valid");
    }

    #[test]
    fn duplicate_id() {
        let services = [
            service("did:sbp:abc#registry", "https://registry.example.com"),
            service("did:sbp:abc#registry", "https://other.example.com"),
        ];
        let err = check_services(&services).expect_err("duplicate should fail");
        assert!(err.is(Err::InvalidInput));
    }

    #[test]
    fn bad_endpoint() {
        let services = [service("did:sbp:abc#registry", "not a url")];
        let err = check_services(&services).expect_err("bad url should fail");
        assert!(err.is(Err::InvalidInput));
    }
}
