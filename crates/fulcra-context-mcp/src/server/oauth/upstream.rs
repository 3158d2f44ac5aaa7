//! Upstream identity provider.
//!
//! The relay only needs two things from the provider: where to send the
//! user, and how to turn the returned code into a credential.

use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::types::UpstreamCredential;
use crate::config::OidcConfig;
use crate::error::UpstreamError;

/// An OIDC provider that authenticates the end user.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// URL of the provider's authorization endpoint for this request.
    fn authorization_url(&self, state: &str, redirect_uri: &str) -> String;

    /// Exchange an authorization code for the upstream credential.
    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<UpstreamCredential, UpstreamError>;
}

#[derive(Debug, Deserialize)]
struct UpstreamTokenResponse {
    access_token: Option<String>,
}

/// Auth0-hosted Fulcra login.
#[derive(Clone)]
pub struct Auth0Provider {
    http: Client,
    config: OidcConfig,
}

impl Auth0Provider {
    /// Create a provider client. Every exchange is bounded by `config.exchange_timeout`.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails.
    pub fn new(config: OidcConfig) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(config.exchange_timeout).build()?;
        Ok(Self { http, config })
    }
}

#[async_trait::async_trait]
impl IdentityProvider for Auth0Provider {
    fn authorization_url(&self, state: &str, redirect_uri: &str) -> String {
        let endpoint = self.config.authorize_endpoint();
        let scope = self.config.scopes.join(" ");
        let params = [
            ("response_type", "code"),
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("scope", scope.as_str()),
            ("audience", self.config.audience.as_str()),
            ("state", state),
        ];

        match Url::parse_with_params(&endpoint, &params) {
            Ok(url) => url.into(),
            Err(e) => {
                // Only reachable with a malformed configured domain.
                tracing::error!(error = %e, endpoint = %endpoint, "Invalid OIDC authorize endpoint");
                endpoint
            }
        }
    }

    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<UpstreamCredential, UpstreamError> {
        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("client_id", self.config.client_id.as_str()),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ];
        if let Some(ref secret) = self.config.client_secret {
            form.push(("client_secret", secret.as_str()));
        }

        let response = self.http.post(self.config.token_endpoint()).form(&form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status { status: status.as_u16(), body });
        }

        let token: UpstreamTokenResponse = response.json().await?;
        token
            .access_token
            .filter(|t| !t.is_empty())
            .map(UpstreamCredential::new)
            .ok_or(UpstreamError::MissingToken)
    }
}

impl std::fmt::Debug for Auth0Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auth0Provider").field("config", &self.config).finish()
    }
}
