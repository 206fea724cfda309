//! SDK configuration: registry connection, project settings and algorithm defaults.
//!
//! Configuration can be read from JSON or from the environment:
//!
//! | Variable                     | Field                    | Default     |
//! |------------------------------|--------------------------|-------------|
//! | `SBP_REGISTRY_ENDPOINT`      | `registry_endpoint`      |             |
//! | `SBP_PROJECT_ID`             | `project_id`             |             |
//! | `SBP_PROJECT_VISIBILITY`     | `project_visibility`     | `public`    |
//! | `SBP_TOKEN`                  | `token`                  |             |
//! | `SBP_DEFAULT_ALGORITHM`      | `default_algorithm`      | `ECDSA`     |
//! | `SBP_DEFAULT_HASH_ALGORITHM` | `default_hash_algorithm` | `SHA256`    |
//! | `SBP_DID_METHOD`             | `did_method`             | `did:sbp:`  |
//! | `SBP_TIMEOUT_SECS`           | `timeout_secs`           | `10`        |
//! | `SBP_LOG_LEVEL`              | `log_level`              | `info`      |

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Err;
use crate::hashing::HashAlgorithm;
use crate::identifier::DID_PREFIX;
use crate::{tracerr, Algorithm, Result};

/// Whether registry data for a project is public or needs a token.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectVisibility {
    /// Anyone can read the project's data.
    #[default]
    Public,
    /// Requests must carry a token.
    Private,
}

/// SDK configuration.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Base URL of the registry API.
    pub registry_endpoint: String,
    /// Registry project the SDK acts for.
    pub project_id: String,
    /// Visibility of the project.
    pub project_visibility: ProjectVisibility,
    /// Registry access token. Required for private projects.
    pub token: Option<String>,
    /// Algorithm for new key pairs.
    pub default_algorithm: Algorithm,
    /// Hash algorithm for digests.
    pub default_hash_algorithm: HashAlgorithm,
    /// Method prefix for derived identifiers.
    pub did_method: String,
    /// Deadline for remote calls, in seconds.
    pub timeout_secs: u64,
    /// Log filter directive for binaries that install a subscriber.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registry_endpoint: String::new(),
            project_id: String::new(),
            project_visibility: ProjectVisibility::Public,
            token: None,
            default_algorithm: Algorithm::Ecdsa,
            default_hash_algorithm: HashAlgorithm::Sha256,
            did_method: "did:sbp:".to_string(),
            timeout_secs: 10,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Read configuration from `SBP_*` environment variables. Unset variables keep their
    /// defaults.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidConfig` - A variable is set to a value that cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(endpoint) = env("SBP_REGISTRY_ENDPOINT") {
            config.registry_endpoint = endpoint;
        }
        if let Some(project_id) = env("SBP_PROJECT_ID") {
            config.project_id = project_id;
        }
        if let Some(visibility) = env("SBP_PROJECT_VISIBILITY") {
            config.project_visibility = match visibility.as_str() {
                "public" => ProjectVisibility::Public,
                "private" => ProjectVisibility::Private,
                _ => tracerr!(Err::InvalidConfig, "invalid project visibility: {visibility}"),
            };
        }
        config.token = env("SBP_TOKEN");
        if let Some(algorithm) = env("SBP_DEFAULT_ALGORITHM") {
            let Ok(algorithm) = algorithm.parse() else {
                tracerr!(Err::InvalidConfig, "invalid default algorithm: {algorithm}");
            };
            config.default_algorithm = algorithm;
        }
        if let Some(algorithm) = env("SBP_DEFAULT_HASH_ALGORITHM") {
            let Ok(algorithm) = algorithm.parse() else {
                tracerr!(Err::InvalidConfig, "invalid default hash algorithm: {algorithm}");
            };
            config.default_hash_algorithm = algorithm;
        }
        if let Some(method) = env("SBP_DID_METHOD") {
            config.did_method = method;
        }
        if let Some(timeout) = env("SBP_TIMEOUT_SECS") {
            let Ok(timeout) = timeout.parse() else {
                tracerr!(Err::InvalidConfig, "invalid timeout: {timeout}");
            };
            config.timeout_secs = timeout;
        }
        if let Some(level) = env("SBP_LOG_LEVEL") {
            config.log_level = level;
        }
        Ok(config)
    }

    /// Read configuration from JSON. Missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidConfig` - The JSON does not describe a configuration.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        match serde_json::from_slice(data) {
            Ok(config) => Ok(config),
            Err(e) => tracerr!(Err::InvalidConfig, "invalid configuration: {e}"),
        }
    }

    /// Check the configuration, reporting every problem at once.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidConfig` - One or more settings are invalid. The context lists them all.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if self.registry_endpoint.is_empty() {
            problems.push("registry endpoint is required".to_string());
        } else if let Err(e) = url::Url::parse(&self.registry_endpoint) {
            problems.push(format!("registry endpoint is not a valid URL: {e}"));
        }
        if self.project_id.is_empty() {
            problems.push("project ID is required".to_string());
        }
        if self.project_visibility == ProjectVisibility::Private
            && self.token.as_deref().unwrap_or_default().is_empty()
        {
            problems.push("token is required for private projects".to_string());
        }
        if !self.did_method.starts_with(DID_PREFIX) {
            problems.push(format!("DID method must start with '{DID_PREFIX}'"));
        }
        if self.timeout_secs == 0 {
            problems.push("timeout must be greater than zero".to_string());
        }

        if !problems.is_empty() {
            tracerr!(Err::InvalidConfig, "{}", problems.join("; "));
        }
        Ok(())
    }

    /// Deadline for remote calls.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn valid() -> Config {
        Config {
            registry_endpoint: "https://registry.example.com".to_string(),
            project_id: "project-1".to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.default_algorithm, Algorithm::Ecdsa);
        assert_eq!(config.default_hash_algorithm, HashAlgorithm::Sha256);
        assert_eq!(config.did_method, "did:sbp:");
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn valid_config() {
        valid().validate().expect("config should be valid");
    }

    #[test]
    fn all_problems_reported() {
        let config = Config {
            project_visibility: ProjectVisibility::Private,
            did_method: "sbp:".to_string(),
            ..Config::default()
        };
        let err = config.validate().expect_err("should fail");
        assert!(err.is(Err::InvalidConfig));

        let message = err.to_string();
        assert!(message.contains("registry endpoint is required"));
        assert!(message.contains("project ID is required"));
        assert!(message.contains("token is required"));
        assert!(message.contains("DID method"));
    }

    #[test]
    fn from_json() {
        let data = json!({
            "registryEndpoint": "https://registry.example.com",
            "projectId": "p1",
            "projectVisibility": "private",
            "token": "secret",
            "defaultAlgorithm": "SM2",
            "defaultHashAlgorithm": "SM3",
        });
        let config = Config::from_json(data.to_string().as_bytes()).expect("should parse");
        assert_eq!(config.default_algorithm, Algorithm::Sm2);
        assert_eq!(config.default_hash_algorithm, HashAlgorithm::Sm3);
        assert_eq!(config.timeout_secs, 10);
        config.validate().expect("config should be valid");

        let err = Config::from_json(br#"{"defaultAlgorithm":"DSA"}"#).expect_err("bad algorithm");
        assert!(err.is(Err::InvalidConfig));
    }
}
