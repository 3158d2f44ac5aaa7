//! OAuth token relay between downstream MCP clients and the upstream provider.
//!
//! Downstream clients only ever see credentials minted here. The upstream
//! credential obtained at callback time rides on the authorization code,
//! then on the token linkage, and is handed to the tool layer per request.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use url::Url;

use super::store::{CredentialStore, StoreStats};
use super::types::{
    AccessToken, AuthorizationCode, AuthorizationParams, PendingAuthorization, RegisteredClient,
    TokenResponse, UpstreamCredential,
};
use super::upstream::IdentityProvider;
use crate::error::{OAuthError, OAuthResult};

/// Authorization code lifetime: 5 minutes.
pub const AUTH_CODE_LIFETIME: u64 = 300;
/// Access token lifetime: 1 hour.
pub const ACCESS_TOKEN_LIFETIME: u64 = 3600;
/// Pending authorizations older than this are dropped by the sweep: 10 minutes.
pub const PENDING_AUTHORIZATION_LIFETIME: u64 = 600;

const CODE_PREFIX: &str = "mcp_code_";
const TOKEN_PREFIX: &str = "mcp_token_";

/// Generate a random token using two UUIDs (256 bits, 244 of them random), as hex.
fn generate_token() -> String {
    format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple())
}

/// The OAuth relay.
pub struct OAuthProxy {
    store: Arc<dyn CredentialStore>,
    upstream: Arc<dyn IdentityProvider>,
    callback_url: String,
    scopes: Vec<String>,
}

impl OAuthProxy {
    /// Create a relay.
    ///
    /// `callback_url` is this server's fixed redirect target at the upstream
    /// provider; `scopes` are granted to every local code and token.
    #[must_use]
    pub fn new(
        store: Arc<dyn CredentialStore>,
        upstream: Arc<dyn IdentityProvider>,
        callback_url: impl Into<String>,
        scopes: Vec<String>,
    ) -> Self {
        Self { store, upstream, callback_url: callback_url.into(), scopes }
    }

    /// Scopes granted to local credentials.
    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Entry counts of the underlying store.
    pub async fn stats(&self) -> StoreStats {
        self.store.stats().await
    }

    // ─── Client Registration ─────────────────────────────────────────────────

    /// Register a new OAuth client (RFC 7591).
    pub async fn register_client(
        &self,
        client_name: Option<String>,
        redirect_uris: Vec<String>,
    ) -> RegisteredClient {
        let client = RegisteredClient {
            client_id: uuid::Uuid::new_v4().simple().to_string(),
            client_name,
            redirect_uris,
            created_at: Utc::now(),
        };
        self.store.insert_client(client.clone()).await;

        tracing::info!(client_id = %client.client_id, "Registered OAuth client");
        client
    }

    /// Look up a registered client.
    pub async fn get_client(&self, client_id: &str) -> OAuthResult<RegisteredClient> {
        self.store.client(client_id).await.ok_or(OAuthError::ClientNotFound)
    }

    // ─── Authorization Initiator ─────────────────────────────────────────────

    /// Record the client's request and return the upstream authorization URL.
    pub async fn authorize(
        &self,
        client: &RegisteredClient,
        params: AuthorizationParams,
    ) -> OAuthResult<String> {
        if self.store.client(&client.client_id).await.is_none() {
            return Err(OAuthError::Authorization("client is not registered".into()));
        }
        if !client.allows_redirect(&params.redirect_uri) {
            return Err(OAuthError::Authorization(
                "redirect_uri not registered for this client".into(),
            ));
        }

        let state = params.state.filter(|s| !s.is_empty()).unwrap_or_else(generate_token);

        let inserted = self
            .store
            .insert_pending(
                state.clone(),
                PendingAuthorization {
                    client_id: client.client_id.clone(),
                    redirect_uri: params.redirect_uri,
                    redirect_uri_provided_explicitly: params.redirect_uri_provided_explicitly,
                    code_challenge: params.code_challenge,
                    created_at: Utc::now(),
                },
            )
            .await;
        if !inserted {
            tracing::warn!(client_id = %client.client_id, "Rejected state that is already pending");
            return Err(OAuthError::Authorization("state is already in use".into()));
        }

        tracing::info!(client_id = %client.client_id, "Redirecting to upstream identity provider");

        Ok(self.upstream.authorization_url(&state, &self.callback_url))
    }

    // ─── Callback Handler ────────────────────────────────────────────────────

    /// Complete the upstream leg and return the redirect back to the client.
    pub async fn handle_callback(&self, code: &str, state: &str) -> OAuthResult<String> {
        // Consumed before the exchange: a state is good for one attempt only.
        let Some(pending) = self.store.take_pending(state).await else {
            tracing::warn!("Callback with unknown or replayed state");
            return Err(OAuthError::InvalidState);
        };

        let upstream_credential =
            match self.upstream.exchange_code(code, &self.callback_url).await {
                Ok(credential) => credential,
                Err(e) => {
                    tracing::warn!(
                        client_id = %pending.client_id,
                        error = %e,
                        "Upstream code exchange failed"
                    );
                    return Err(OAuthError::UpstreamExchange);
                }
            };

        let mut redirect = Url::parse(&pending.redirect_uri).map_err(|e| {
            tracing::warn!(client_id = %pending.client_id, error = %e, "Stored redirect_uri is not a URL");
            OAuthError::InvalidRequest("redirect_uri is not a valid URL".into())
        })?;

        let code = AuthorizationCode {
            code: format!("{CODE_PREFIX}{}", generate_token()),
            client_id: pending.client_id,
            redirect_uri: pending.redirect_uri,
            redirect_uri_provided_explicitly: pending.redirect_uri_provided_explicitly,
            expires_at: Utc::now() + chrono::Duration::seconds(AUTH_CODE_LIFETIME as i64),
            scopes: self.scopes.clone(),
            code_challenge: pending.code_challenge,
            upstream_credential,
        };

        redirect.query_pairs_mut().append_pair("code", &code.code).append_pair("state", state);

        tracing::info!(client_id = %code.client_id, "Issued authorization code");
        self.store.insert_code(code).await;

        Ok(redirect.into())
    }

    /// Drop the pending authorization for `state` after the provider reported
    /// an error. Returns whether the state was pending.
    pub async fn abort_callback(&self, state: &str) -> bool {
        match self.store.take_pending(state).await {
            Some(pending) => {
                tracing::info!(client_id = %pending.client_id, "Discarded pending authorization");
                true
            }
            None => false,
        }
    }

    // ─── Token Exchanger ─────────────────────────────────────────────────────

    /// Look up an authorization code for `client` without consuming it.
    ///
    /// Expired codes are removed and reported as absent.
    pub async fn load_authorization_code(
        &self,
        client: &RegisteredClient,
        code: &str,
    ) -> Option<AuthorizationCode> {
        let auth_code = self.store.code(code).await?;
        if auth_code.is_expired_at(Utc::now()) {
            self.store.take_code(code).await;
            return None;
        }
        (auth_code.client_id == client.client_id).then_some(auth_code)
    }

    /// Exchange a local authorization code for a local access token.
    pub async fn exchange_authorization_code(
        &self,
        client: &RegisteredClient,
        code: &str,
    ) -> OAuthResult<TokenResponse> {
        let Some(auth_code) = self.store.take_code(code).await else {
            return Err(OAuthError::InvalidGrant);
        };
        if auth_code.is_expired_at(Utc::now()) {
            tracing::info!(client_id = %client.client_id, "Rejected expired authorization code");
            return Err(OAuthError::InvalidGrant);
        }
        if auth_code.client_id != client.client_id {
            tracing::warn!(client_id = %client.client_id, "Authorization code presented by another client");
            return Err(OAuthError::InvalidGrant);
        }

        let token = format!("{TOKEN_PREFIX}{}", generate_token());
        let scope = auth_code.scopes.join(" ");

        // Linkage first, so a visible token is always resolvable.
        self.store.link(token.clone(), auth_code.upstream_credential).await;
        self.store
            .insert_token(AccessToken {
                token: token.clone(),
                client_id: auth_code.client_id,
                scopes: auth_code.scopes,
                expires_at: Some(
                    Utc::now() + chrono::Duration::seconds(ACCESS_TOKEN_LIFETIME as i64),
                ),
            })
            .await;

        tracing::info!(client_id = %client.client_id, "Issued access token");

        Ok(TokenResponse {
            access_token: token,
            token_type: "bearer",
            expires_in: ACCESS_TOKEN_LIFETIME,
            scope,
        })
    }

    /// Refresh tokens are never issued, so every refresh is rejected.
    pub async fn exchange_refresh_token(
        &self,
        client: &RegisteredClient,
        _refresh_token: &str,
    ) -> OAuthResult<TokenResponse> {
        tracing::info!(client_id = %client.client_id, "Rejected refresh token grant");
        Err(OAuthError::UnsupportedGrant)
    }

    // ─── Token Validator ─────────────────────────────────────────────────────

    /// Validate a bearer token. Expired tokens are removed on sight.
    pub async fn load_access_token(&self, token: &str) -> Option<AccessToken> {
        let access = self.store.token(token).await?;
        if access.is_expired_at(Utc::now()) {
            self.store.remove_token(token).await;
            tracing::debug!(client_id = %access.client_id, "Removed expired access token");
            return None;
        }
        Some(access)
    }

    /// Resolve a bearer token to the upstream credential for a tool call.
    pub async fn resolve_upstream_credential(
        &self,
        token: &str,
    ) -> OAuthResult<UpstreamCredential> {
        let access = self.load_access_token(token).await.ok_or(OAuthError::NotAuthenticated)?;
        self.store.linked_credential(&access.token).await.ok_or_else(|| {
            tracing::warn!(client_id = %access.client_id, "Access token has no upstream linkage");
            OAuthError::NotAuthenticated
        })
    }

    // ─── Revoker ─────────────────────────────────────────────────────────────

    /// Revoke a token and its linkage. Unknown tokens are ignored.
    pub async fn revoke_token(&self, token: &str) {
        if self.store.remove_token(token).await {
            tracing::info!("Revoked access token");
        }
    }

    // ─── Expiry Sweep ────────────────────────────────────────────────────────

    /// Remove expired codes, tokens and stale pending authorizations.
    pub async fn sweep_expired(&self) -> usize {
        let now = Utc::now();
        let cutoff = now - chrono::Duration::seconds(PENDING_AUTHORIZATION_LIFETIME as i64);
        let swept = self.store.sweep_expired(now, cutoff).await;
        if swept.total() > 0 {
            tracing::debug!(
                pending = swept.pending,
                codes = swept.codes,
                tokens = swept.tokens,
                "Swept expired OAuth state"
            );
        }
        swept.total()
    }

    /// Start background cleanup task for expired credentials.
    pub fn start_cleanup_task(self: Arc<Self>, interval: Duration) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(interval);
            loop {
                interval.tick().await;
                self.sweep_expired().await;
            }
        });
    }
}

impl std::fmt::Debug for OAuthProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthProxy")
            .field("callback_url", &self.callback_url)
            .field("scopes", &self.scopes)
            .finish()
    }
}
