//! OAuth 2.0 types for the token relay.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A dynamically registered OAuth client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredClient {
    pub client_id: String,
    pub client_name: Option<String>,
    pub redirect_uris: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl RegisteredClient {
    /// Whether `redirect_uri` is one of the registered redirect URIs.
    #[must_use]
    pub fn allows_redirect(&self, redirect_uri: &str) -> bool {
        self.redirect_uris.iter().any(|u| u == redirect_uri)
    }
}

/// Client parameters remembered between `/authorize` and `/callback`.
#[derive(Debug, Clone)]
pub struct PendingAuthorization {
    pub client_id: String,
    pub redirect_uri: String,
    pub redirect_uri_provided_explicitly: bool,
    pub code_challenge: String,
    pub created_at: DateTime<Utc>,
}

/// Parameters of a downstream authorization request.
#[derive(Debug, Clone)]
pub struct AuthorizationParams {
    pub redirect_uri: String,
    pub redirect_uri_provided_explicitly: bool,
    pub state: Option<String>,
    pub code_challenge: String,
}

/// A credential issued by the upstream identity provider.
///
/// Never sent downstream; `Debug` is redacted so it cannot leak through logs.
#[derive(Clone, PartialEq, Eq)]
pub struct UpstreamCredential(String);

impl UpstreamCredential {
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// The raw secret, for the `Authorization` header of data API calls.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for UpstreamCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("UpstreamCredential(<redacted>)")
    }
}

/// A local authorization code minted at callback time.
#[derive(Debug, Clone)]
pub struct AuthorizationCode {
    pub code: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub redirect_uri_provided_explicitly: bool,
    pub expires_at: DateTime<Utc>,
    pub scopes: Vec<String>,
    pub code_challenge: String,
    pub upstream_credential: UpstreamCredential,
}

impl AuthorizationCode {
    /// Expired at or after `expires_at`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// A local access token handed to downstream clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub client_id: String,
    pub scopes: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Tokens without `expires_at` never expire.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Successful token endpoint response (RFC 6749 §5.1).
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    pub scope: String,
}
