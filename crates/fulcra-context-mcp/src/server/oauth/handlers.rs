//! OAuth 2.0 endpoint handlers for MCP authentication.
//!
//! Implements:
//! - RFC 9728: OAuth Protected Resource Metadata
//! - RFC 8414: OAuth Authorization Server Metadata
//! - RFC 7591: Dynamic Client Registration
//! - RFC 7636: PKCE (S256)
//! - RFC 6749: OAuth 2.0 Authorization Code Grant
//! - RFC 7009: Token Revocation
//!
//! The authorization leg is relayed to the upstream provider; see [`super::proxy`].

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use super::pkce;
use super::types::{AuthorizationParams, TokenResponse};
use crate::error::OAuthError;
use crate::server::transport::HttpState;

impl IntoResponse for OAuthError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::BAD_REQUEST);
        (
            status,
            Json(serde_json::json!({
                "error": self.error_code(),
                "error_description": self.to_string()
            })),
        )
            .into_response()
    }
}

// ─── RFC 9728: Protected Resource Metadata ───────────────────────────────────

/// `GET /.well-known/oauth-protected-resource`
///
/// Tells clients where to find the authorization server for this resource.
pub async fn handle_protected_resource(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "resource": format!("{}/mcp", state.base_url),
        "authorization_servers": [state.base_url],
        "bearer_methods_supported": ["header"],
        "scopes_supported": state.proxy.scopes()
    }))
}

// ─── RFC 8414: Authorization Server Metadata ─────────────────────────────────

/// `GET /.well-known/oauth-authorization-server`
pub async fn handle_auth_server_metadata(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "issuer": state.base_url,
        "authorization_endpoint": format!("{}/authorize", state.base_url),
        "token_endpoint": format!("{}/token", state.base_url),
        "registration_endpoint": format!("{}/register", state.base_url),
        "revocation_endpoint": format!("{}/revoke", state.base_url),
        "scopes_supported": state.proxy.scopes(),
        "response_types_supported": ["code"],
        "grant_types_supported": ["authorization_code"],
        "token_endpoint_auth_methods_supported": ["none"],
        "revocation_endpoint_auth_methods_supported": ["none"],
        "code_challenge_methods_supported": ["S256"]
    }))
}

// ─── RFC 7591: Dynamic Client Registration ───────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub client_name: Option<String>,
    pub redirect_uris: Option<Vec<String>>,
    #[serde(default)]
    pub grant_types: Vec<String>,
    #[serde(default)]
    pub response_types: Vec<String>,
    pub token_endpoint_auth_method: Option<String>,
}

fn registration_error(error: &str, description: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({
            "error": error,
            "error_description": description
        })),
    )
        .into_response()
}

/// `POST /register`
pub async fn handle_register(
    State(state): State<Arc<HttpState>>,
    Json(req): Json<RegisterRequest>,
) -> Response {
    let redirect_uris = req.redirect_uris.unwrap_or_default();
    if redirect_uris.is_empty() {
        return registration_error("invalid_client_metadata", "redirect_uris is required");
    }
    if redirect_uris.iter().any(|u| url::Url::parse(u).is_err()) {
        return registration_error("invalid_redirect_uri", "redirect_uris must be absolute URLs");
    }
    if req.grant_types.iter().any(|g| g != "authorization_code") {
        return registration_error(
            "invalid_client_metadata",
            "only the authorization_code grant is supported",
        );
    }
    if req.response_types.iter().any(|r| r != "code") {
        return registration_error("invalid_client_metadata", "only response_type code is supported");
    }

    let client = state.proxy.register_client(req.client_name, redirect_uris).await;

    (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "client_id": client.client_id,
            "client_id_issued_at": client.created_at.timestamp(),
            "client_name": client.client_name,
            "redirect_uris": client.redirect_uris,
            "grant_types": ["authorization_code"],
            "response_types": ["code"],
            "token_endpoint_auth_method": "none"
        })),
    )
        .into_response()
}

// ─── Authorization Endpoint ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AuthorizeQuery {
    pub client_id: Option<String>,
    pub redirect_uri: Option<String>,
    pub response_type: Option<String>,
    pub state: Option<String>,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<String>,
    pub scope: Option<String>,
}

/// `GET /authorize`
///
/// Validates the downstream request, records it, and sends the user on to
/// the upstream provider's login page.
pub async fn handle_authorize_get(
    State(state): State<Arc<HttpState>>,
    Query(query): Query<AuthorizeQuery>,
) -> Response {
    let Some(client_id) = query.client_id.as_deref() else {
        return (StatusCode::BAD_REQUEST, "Missing client_id").into_response();
    };
    let Ok(client) = state.proxy.get_client(client_id).await else {
        return (StatusCode::BAD_REQUEST, "Unknown client_id").into_response();
    };

    // Fall back to the only registered redirect URI (RFC 6749 §3.1.2.3).
    let (redirect_uri, explicit) = match query.redirect_uri {
        Some(uri) => (uri, true),
        None => match client.redirect_uris.as_slice() {
            [only] => (only.clone(), false),
            _ => {
                return (StatusCode::BAD_REQUEST, "Missing redirect_uri").into_response();
            }
        },
    };

    if query.response_type.as_deref() != Some("code") {
        return (StatusCode::BAD_REQUEST, "response_type must be 'code'").into_response();
    }
    let Some(code_challenge) = query.code_challenge else {
        return (StatusCode::BAD_REQUEST, "Missing code_challenge").into_response();
    };
    if query.code_challenge_method.as_deref() != Some("S256") {
        return (StatusCode::BAD_REQUEST, "code_challenge_method must be 'S256'").into_response();
    }
    if let Some(ref scope) = query.scope {
        tracing::debug!(client_id = %client_id, scope = %scope, "Ignoring requested scope");
    }

    let params = AuthorizationParams {
        redirect_uri,
        redirect_uri_provided_explicitly: explicit,
        state: query.state,
        code_challenge,
    };

    match state.proxy.authorize(&client, params).await {
        Ok(upstream_url) => (StatusCode::FOUND, [(header::LOCATION, upstream_url)]).into_response(),
        Err(e) => e.into_response(),
    }
}

// ─── Upstream Callback ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// `GET /callback`
///
/// Landing point for the upstream provider. On success, redirects the user
/// back to the downstream client with a local authorization code.
pub async fn handle_callback(
    State(state): State<Arc<HttpState>>,
    Query(query): Query<CallbackQuery>,
) -> Response {
    if let Some(ref error) = query.error {
        tracing::warn!(
            error = %error,
            description = query.error_description.as_deref().unwrap_or(""),
            "Upstream provider returned an error"
        );
        if let Some(ref oauth_state) = query.state {
            state.proxy.abort_callback(oauth_state).await;
        }
        return OAuthError::UpstreamExchange.into_response();
    }

    let (Some(code), Some(oauth_state)) = (query.code.as_deref(), query.state.as_deref()) else {
        return OAuthError::InvalidRequest("Missing code or state parameter".into())
            .into_response();
    };

    match state.proxy.handle_callback(code, oauth_state).await {
        Ok(redirect) => (StatusCode::FOUND, [(header::LOCATION, redirect)]).into_response(),
        Err(e) => e.into_response(),
    }
}

// ─── Token Endpoint ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub grant_type: Option<String>,
    pub code: Option<String>,
    pub redirect_uri: Option<String>,
    pub code_verifier: Option<String>,
    pub client_id: Option<String>,
    pub refresh_token: Option<String>,
}

/// `POST /token`
///
/// Exchange a local authorization code for a local access token.
pub async fn handle_token(
    State(state): State<Arc<HttpState>>,
    axum::Form(form): axum::Form<TokenRequest>,
) -> Response {
    let Some(ref client_id) = form.client_id else {
        return OAuthError::ClientNotFound.into_response();
    };
    let Ok(client) = state.proxy.get_client(client_id).await else {
        return OAuthError::ClientNotFound.into_response();
    };

    let result = match form.grant_type.as_deref() {
        Some("authorization_code") => handle_authorization_code_grant(&state, &client, &form).await,
        Some("refresh_token") => {
            let Some(ref refresh_token) = form.refresh_token else {
                return OAuthError::InvalidRequest("Missing refresh_token".into()).into_response();
            };
            state.proxy.exchange_refresh_token(&client, refresh_token).await
        }
        Some(_) => Err(OAuthError::UnsupportedGrant),
        None => Err(OAuthError::InvalidRequest("Missing grant_type".into())),
    };

    match result {
        Ok(response) => token_success(&response),
        Err(e) => e.into_response(),
    }
}

async fn handle_authorization_code_grant(
    state: &HttpState,
    client: &super::types::RegisteredClient,
    form: &TokenRequest,
) -> Result<TokenResponse, OAuthError> {
    let Some(ref code) = form.code else {
        return Err(OAuthError::InvalidRequest("Missing code".into()));
    };
    let Some(ref code_verifier) = form.code_verifier else {
        return Err(OAuthError::InvalidRequest("Missing code_verifier".into()));
    };

    let Some(auth_code) = state.proxy.load_authorization_code(client, code).await else {
        return Err(OAuthError::InvalidGrant);
    };

    // RFC 6749 §4.1.3: required and identical if it was sent to /authorize.
    if auth_code.redirect_uri_provided_explicitly
        && form.redirect_uri.as_deref() != Some(auth_code.redirect_uri.as_str())
    {
        return Err(OAuthError::InvalidRequest("redirect_uri mismatch".into()));
    }

    if !pkce::verify_s256(code_verifier, &auth_code.code_challenge) {
        tracing::info!(client_id = %client.client_id, "PKCE verification failed");
        return Err(OAuthError::InvalidGrant);
    }

    state.proxy.exchange_authorization_code(client, code).await
}

/// Build a token response with required OAuth 2.0 cache headers (RFC 6749 §5.1).
fn token_success(token: &TokenResponse) -> Response {
    let mut response = Json(token).into_response();

    let headers = response.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    response
}

// ─── RFC 7009: Token Revocation ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RevokeRequest {
    pub token: Option<String>,
    pub token_type_hint: Option<String>,
}

/// `POST /revoke`
///
/// Always answers 200, whether or not the token was known (RFC 7009 §2.2).
pub async fn handle_revoke(
    State(state): State<Arc<HttpState>>,
    axum::Form(form): axum::Form<RevokeRequest>,
) -> StatusCode {
    if let Some(ref token) = form.token {
        state.proxy.revoke_token(token).await;
    }
    StatusCode::OK
}
