//! Bearer token boundary for the MCP endpoint.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};

use super::transport::HttpState;

/// Resolve `Authorization: Bearer <token>` to the upstream credential.
///
/// On success the [`UpstreamCredential`](super::oauth::UpstreamCredential)
/// is stored in the request extensions for the tool layer. Otherwise the
/// request is answered with 401 and an RFC 9728 `WWW-Authenticate` challenge.
pub async fn require_bearer(
    State(state): State<Arc<HttpState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(bearer) = request.headers().typed_get::<Authorization<Bearer>>() else {
        tracing::debug!("Missing or malformed Authorization header");
        return unauthorized(&state.base_url);
    };

    match state.proxy.resolve_upstream_credential(bearer.token()).await {
        Ok(credential) => {
            request.extensions_mut().insert(credential);
            next.run(request).await
        }
        Err(_) => {
            tracing::debug!("Rejected bearer token");
            unauthorized(&state.base_url)
        }
    }
}

fn unauthorized(base_url: &str) -> Response {
    let challenge =
        format!(r#"Bearer resource_metadata="{base_url}/.well-known/oauth-protected-resource""#);
    (StatusCode::UNAUTHORIZED, [(header::WWW_AUTHENTICATE, challenge)]).into_response()
}
