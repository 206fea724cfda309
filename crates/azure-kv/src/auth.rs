use std::time::Duration;

use chrono::{DateTime, Utc};
use did_core::error::Err;
use did_core::{tracerr, Result};
use oauth2::basic::BasicClient;
use oauth2::reqwest::async_http_client;
use oauth2::{AuthType, AuthUrl, ClientId, ClientSecret, Scope, TokenResponse, TokenUrl};
use reqwest::Url;

const AZURE_PUBLIC_CLOUD: &str = "https://login.microsoftonline.com";
const AUDIENCE: &str = "https://vault.azure.net";

// Tokens this close to expiry are refreshed.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Vault location and service principal credentials.
#[derive(Clone)]
pub struct AzureConfig {
    /// URL of the Azure Key Vault.
    pub vault_url: String,
    /// The Azure Active Directory tenant (directory) ID.
    pub tenant_id: String,
    /// The client (application) ID of an App Registration in the tenant.
    pub client_id: String,
    /// A client secret that was generated for the App Registration.
    pub client_secret: String,
    /// Identity provider base URL. Defaults to the Azure public cloud.
    pub authority: String,
}

impl std::fmt::Debug for AzureConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureConfig")
            .field("vault_url", &self.vault_url)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("authority", &self.authority)
            .finish_non_exhaustive()
    }
}

impl AzureConfig {
    /// Create a configuration for the Azure public cloud.
    #[must_use]
    pub fn new(
        vault_url: impl Into<String>, tenant_id: impl Into<String>, client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            vault_url: vault_url.into(),
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            authority: AZURE_PUBLIC_CLOUD.to_string(),
        }
    }

    /// Read the configuration from environment variables:
    ///
    /// | Variable              | Description                                                      |
    /// |-----------------------|------------------------------------------------------------------|
    /// | `AZURE_KEY_VAULT`     | URL of the Azure Key Vault.                                      |
    /// | `AZURE_TENANT_ID`     | The Azure Active Directory tenant(directory) ID.                 |
    /// | `AZURE_CLIENT_ID`     | The client(application) ID of an App Registration in the tenant. |
    /// | `AZURE_CLIENT_SECRET` | A client secret that was generated for the App Registration.     |
    /// | `AZURE_AUTHORITY`     | Optional identity provider URL.                                  |
    ///
    /// # Errors
    ///
    /// * `Err::InvalidConfig` - A required variable is not set.
    pub fn from_env() -> Result<Self> {
        let Ok(vault_url) = std::env::var("AZURE_KEY_VAULT") else {
            tracerr!(Err::InvalidConfig, "AZURE_KEY_VAULT environment variable not set")
        };
        let Ok(tenant_id) = std::env::var("AZURE_TENANT_ID") else {
            tracerr!(Err::InvalidConfig, "AZURE_TENANT_ID environment variable not set")
        };
        let Ok(client_id) = std::env::var("AZURE_CLIENT_ID") else {
            tracerr!(Err::InvalidConfig, "AZURE_CLIENT_ID environment variable not set")
        };
        let Ok(client_secret) = std::env::var("AZURE_CLIENT_SECRET") else {
            tracerr!(Err::InvalidConfig, "AZURE_CLIENT_SECRET environment variable not set")
        };

        let mut config = Self::new(vault_url, tenant_id, client_id, client_secret);
        if let Ok(authority) = std::env::var("AZURE_AUTHORITY") {
            config.authority = authority;
        }
        Ok(config)
    }
}

/// Access token.
#[derive(Clone)]
pub struct AccessToken {
    token: String,
    expires: DateTime<Utc>,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken").field("expires", &self.expires).finish_non_exhaustive()
    }
}

impl AccessToken {
    /// Access token as a string.
    pub fn as_str(&self) -> &str {
        self.token.as_str()
    }

    /// Whether the token can still be used.
    pub fn is_fresh(&self) -> bool {
        self.expires > Utc::now() + chrono::Duration::seconds(EXPIRY_MARGIN_SECS)
    }

    /// Exchange client credentials for an access token.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidConfig` - The authority URL is not valid.
    /// * `Err::AuthError` - The identity provider refused the credentials.
    /// * `Err::Timeout` - The exchange did not finish within `timeout`.
    pub async fn fetch(config: &AzureConfig, timeout: Duration) -> Result<Self> {
        let authority = config.authority.trim_end_matches('/');
        let tenant = &config.tenant_id;
        let Ok(t_url) = Url::parse(&format!("{authority}/{tenant}/oauth2/v2.0/token")) else {
            tracerr!(Err::InvalidConfig, "invalid authority URL: {authority}")
        };
        let Ok(a_url) = Url::parse(&format!("{authority}/{tenant}/oauth2/v2.0/authorize")) else {
            tracerr!(Err::InvalidConfig, "invalid authority URL: {authority}")
        };

        let client = BasicClient::new(
            ClientId::new(config.client_id.clone()),
            Some(ClientSecret::new(config.client_secret.clone())),
            AuthUrl::from_url(a_url),
            Some(TokenUrl::from_url(t_url)),
        )
        .set_auth_type(AuthType::RequestBody);

        let exchange = client
            .exchange_client_credentials()
            .add_scope(Scope::new(format!("{AUDIENCE}/.default")))
            .request_async(async_http_client);

        let token_res = match tokio::time::timeout(timeout, exchange).await {
            Ok(Ok(token_res)) => token_res,
            Ok(Err(e)) => tracerr!(Err::AuthError, "failed to get access token: {e}"),
            Err(_) => tracerr!(Err::Timeout, "access token request timed out"),
        };

        let lifetime = token_res.expires_in().unwrap_or_default();
        let lifetime = chrono::Duration::from_std(lifetime).unwrap_or_default();
        Ok(Self {
            token: token_res.access_token().secret().to_string(),
            expires: Utc::now() + lifetime,
        })
    }
}
