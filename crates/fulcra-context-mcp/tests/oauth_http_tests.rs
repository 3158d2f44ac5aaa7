//! End-to-end tests for the OAuth token relay over HTTP.
//!
//! A wiremock server plays both the upstream identity provider and the
//! Fulcra data API; the router is driven with `tower::ServiceExt::oneshot`.

use std::collections::HashMap;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::json;
use sha2::{Digest, Sha256};
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, header as header_eq, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fulcra_context_mcp::config::Config;
use fulcra_context_mcp::server::McpServer;

const CLIENT_REDIRECT: &str = "https://client.example.com/cb";
const CODE_VERIFIER: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
const UPSTREAM_CODE: &str = "upstream-code-1";
const UPSTREAM_TOKEN: &str = "upstream-access-token";

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Reply {
    fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    fn location(&self) -> url::Url {
        url::Url::parse(self.headers[header::LOCATION].to_str().unwrap()).unwrap()
    }

    fn location_query(&self) -> HashMap<String, String> {
        self.location().query_pairs().into_owned().collect()
    }
}

async fn send(app: &axum::Router, request: Request<Body>) -> Reply {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec();
    Reply { status, headers, body }
}

fn form(uri: &str, params: &[(&str, &str)]) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(serde_urlencoded::to_string(params).unwrap()))
        .unwrap()
}

fn mcp(token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::post("/mcp").header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn code_challenge() -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(CODE_VERIFIER.as_bytes()))
}

async fn mount_upstream_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains(format!("code={UPSTREAM_CODE}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": UPSTREAM_TOKEN,
            "token_type": "Bearer",
            "expires_in": 86400
        })))
        .mount(server)
        .await;
}

async fn setup() -> (axum::Router, MockServer) {
    let server = MockServer::start().await;
    mount_upstream_token(&server).await;
    let app = McpServer::new(Config::for_testing(&server.uri())).unwrap().into_router();
    (app, server)
}

async fn register(app: &axum::Router, redirect_uris: &[&str]) -> String {
    let reply = send(
        app,
        Request::post("/register")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({ "client_name": "Test Client", "redirect_uris": redirect_uris })
                    .to_string(),
            ))
            .unwrap(),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED);
    reply.json()["client_id"].as_str().unwrap().to_string()
}

fn authorize_uri(client_id: &str, redirect_uri: Option<&str>, state: &str) -> String {
    let challenge = code_challenge();
    let mut params = vec![
        ("client_id", client_id),
        ("response_type", "code"),
        ("state", state),
        ("code_challenge", challenge.as_str()),
        ("code_challenge_method", "S256"),
    ];
    if let Some(uri) = redirect_uri {
        params.push(("redirect_uri", uri));
    }
    format!("/authorize?{}", serde_urlencoded::to_string(&params).unwrap())
}

/// Run /authorize and /callback; returns the local authorization code.
async fn obtain_code(app: &axum::Router, client_id: &str, redirect_uri: Option<&str>) -> String {
    let reply = send(
        app,
        Request::get(authorize_uri(client_id, redirect_uri, "xyz123")).body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(reply.status, StatusCode::FOUND);
    let state = reply.location_query()["state"].clone();

    let reply = send(
        app,
        Request::get(format!("/callback?code={UPSTREAM_CODE}&state={state}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(reply.status, StatusCode::FOUND);
    reply.location_query()["code"].clone()
}

async fn exchange(app: &axum::Router, client_id: &str, code: &str) -> Reply {
    send(
        app,
        form(
            "/token",
            &[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", CLIENT_REDIRECT),
                ("code_verifier", CODE_VERIFIER),
                ("client_id", client_id),
            ],
        ),
    )
    .await
}

// =============================================================================
// Discovery
// =============================================================================

#[tokio::test]
async fn test_metadata_endpoints() {
    let (app, _server) = setup().await;

    let reply = send(
        &app,
        Request::get("/.well-known/oauth-protected-resource").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    let json = reply.json();
    assert_eq!(json["resource"], "https://mcp.example.com/mcp");
    assert_eq!(json["authorization_servers"][0], "https://mcp.example.com");

    let reply = send(
        &app,
        Request::get("/.well-known/oauth-authorization-server").body(Body::empty()).unwrap(),
    )
    .await;
    let json = reply.json();
    assert_eq!(json["issuer"], "https://mcp.example.com");
    assert_eq!(json["token_endpoint"], "https://mcp.example.com/token");
    assert_eq!(json["grant_types_supported"], json!(["authorization_code"]));
    assert_eq!(json["code_challenge_methods_supported"], json!(["S256"]));
}

#[tokio::test]
async fn test_register_requires_redirect_uris() {
    let (app, _server) = setup().await;

    let reply = send(
        &app,
        Request::post("/register")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "client_name": "No redirects" }).to_string()))
            .unwrap(),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["error"], "invalid_client_metadata");
}

// =============================================================================
// Full Flow
// =============================================================================

#[tokio::test]
async fn test_full_flow_reaches_data_api_with_upstream_credential() {
    let (app, server) = setup().await;

    Mock::given(method("GET"))
        .and(path("/data/v0/llm/apple_workouts"))
        .and(header_eq("Authorization", format!("Bearer {UPSTREAM_TOKEN}").as_str()))
        .and(query_param("start_time", "2024-05-01T00:00:00-04:00"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"activity": "running", "duration": 1800}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client_id = register(&app, &[CLIENT_REDIRECT]).await;

    // Authorize redirects to the upstream provider with our callback.
    let reply = send(
        &app,
        Request::get(authorize_uri(&client_id, Some(CLIENT_REDIRECT), "xyz123"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(reply.status, StatusCode::FOUND);
    let upstream = reply.location();
    assert!(upstream.as_str().starts_with(&format!("{}/authorize", server.uri())));
    let query = reply.location_query();
    assert_eq!(query["state"], "xyz123");
    assert_eq!(query["redirect_uri"], "https://mcp.example.com/callback");
    assert_eq!(query["client_id"], "test-upstream-client");

    // Callback redirects back to the client with a local code.
    let reply = send(
        &app,
        Request::get(format!("/callback?code={UPSTREAM_CODE}&state=xyz123"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(reply.status, StatusCode::FOUND);
    assert!(reply.location().as_str().starts_with(CLIENT_REDIRECT));
    let query = reply.location_query();
    assert_eq!(query["state"], "xyz123");
    let code = query["code"].clone();
    assert!(code.starts_with("mcp_code_"));

    // Token exchange.
    let reply = exchange(&app, &client_id, &code).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.headers[header::CACHE_CONTROL], "no-store");
    let json = reply.json();
    assert_eq!(json["token_type"], "bearer");
    assert_eq!(json["expires_in"], 3600);
    assert!(json.get("refresh_token").is_none());
    let token = json["access_token"].as_str().unwrap().to_string();
    assert!(token.starts_with("mcp_token_"));
    assert_ne!(token, UPSTREAM_TOKEN);

    // Tool call goes out with the upstream credential.
    let reply = send(
        &app,
        mcp(
            Some(&token),
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "tools/call",
                "params": {
                    "name": "get_workouts",
                    "arguments": {
                        "start_time": "2024-05-01T00:00:00-04:00",
                        "end_time": "2024-05-02T00:00:00-04:00"
                    }
                }
            }),
        ),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    let json = reply.json();
    let text = json["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.starts_with("Workouts during"));
    assert!(text.contains("running"));

    // Codes are single use.
    let reply = exchange(&app, &client_id, &code).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["error"], "invalid_grant");
}

#[tokio::test]
async fn test_authorize_without_redirect_uri_uses_single_registered() {
    let (app, _server) = setup().await;
    let client_id = register(&app, &[CLIENT_REDIRECT]).await;

    let code = obtain_code(&app, &client_id, None).await;

    // redirect_uri was implicit, so the token request may omit it.
    let reply = send(
        &app,
        form(
            "/token",
            &[
                ("grant_type", "authorization_code"),
                ("code", code.as_str()),
                ("code_verifier", CODE_VERIFIER),
                ("client_id", client_id.as_str()),
            ],
        ),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
}

#[tokio::test]
async fn test_authorize_without_redirect_uri_ambiguous() {
    let (app, _server) = setup().await;
    let client_id = register(&app, &[CLIENT_REDIRECT, "https://client.example.com/other"]).await;

    let reply = send(
        &app,
        Request::get(authorize_uri(&client_id, None, "s")).body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_authorize_rejects_bad_requests() {
    let (app, _server) = setup().await;
    let client_id = register(&app, &[CLIENT_REDIRECT]).await;

    // Unknown client
    let reply = send(
        &app,
        Request::get(authorize_uri("nope", Some(CLIENT_REDIRECT), "s")).body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    // Unregistered redirect
    let reply = send(
        &app,
        Request::get(authorize_uri(&client_id, Some("https://evil.example.com/cb"), "s"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["error"], "unauthorized_client");

    // Plain PKCE
    let uri = authorize_uri(&client_id, Some(CLIENT_REDIRECT), "s")
        .replace("code_challenge_method=S256", "code_challenge_method=plain");
    let reply = send(&app, Request::get(uri).body(Body::empty()).unwrap()).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Callback Failures
// =============================================================================

#[tokio::test]
async fn test_callback_missing_parameters() {
    let (app, _server) = setup().await;

    for uri in ["/callback", "/callback?code=abc", "/callback?state=abc"] {
        let reply = send(&app, Request::get(uri).body(Body::empty()).unwrap()).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn test_callback_unknown_state() {
    let (app, _server) = setup().await;

    let reply = send(
        &app,
        Request::get(format!("/callback?code={UPSTREAM_CODE}&state=forged"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["error"], "invalid_request");
}

#[tokio::test]
async fn test_callback_upstream_rejection_is_generic() {
    let (app, _server) = setup().await;
    let client_id = register(&app, &[CLIENT_REDIRECT]).await;

    send(
        &app,
        Request::get(authorize_uri(&client_id, Some(CLIENT_REDIRECT), "S"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    // Only UPSTREAM_CODE is accepted by the mock; anything else is a 404 upstream.
    let reply = send(
        &app,
        Request::get("/callback?code=wrong-code&state=S").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    let json = reply.json();
    assert_eq!(json["error"], "access_denied");
    assert!(!json["error_description"].as_str().unwrap().contains("404"));

    // The state was consumed by the failed attempt.
    let reply = send(
        &app,
        Request::get(format!("/callback?code={UPSTREAM_CODE}&state=S"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_callback_provider_error_parameter() {
    let (app, _server) = setup().await;
    let client_id = register(&app, &[CLIENT_REDIRECT]).await;

    let reply = send(
        &app,
        Request::get(authorize_uri(&client_id, Some(CLIENT_REDIRECT), "S"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(reply.status, StatusCode::FOUND);

    let reply = send(
        &app,
        Request::get("/callback?error=access_denied&error_description=User%20cancelled&state=S")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["error"], "access_denied");

    // The failed callback used up the state.
    let reply = send(
        &app,
        Request::get(format!("/callback?code={UPSTREAM_CODE}&state=S"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["error"], "invalid_request");
}

#[tokio::test]
async fn test_authorize_rejects_state_pending_for_another_client() {
    let (app, _server) = setup().await;
    let alice = register(&app, &[CLIENT_REDIRECT]).await;
    let mallory = register(&app, &["https://mallory.example/cb"]).await;

    let reply = send(
        &app,
        Request::get(authorize_uri(&alice, Some(CLIENT_REDIRECT), "1")).body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(reply.status, StatusCode::FOUND);

    let reply = send(
        &app,
        Request::get(authorize_uri(&mallory, Some("https://mallory.example/cb"), "1"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["error"], "unauthorized_client");

    let reply = send(
        &app,
        Request::get(format!("/callback?code={UPSTREAM_CODE}&state=1"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(reply.status, StatusCode::FOUND);
    assert!(reply.location().as_str().starts_with(CLIENT_REDIRECT));
}

// =============================================================================
// Token Endpoint
// =============================================================================

#[tokio::test]
async fn test_token_rejects_wrong_verifier() {
    let (app, _server) = setup().await;
    let client_id = register(&app, &[CLIENT_REDIRECT]).await;
    let code = obtain_code(&app, &client_id, Some(CLIENT_REDIRECT)).await;

    let wrong_verifier = "x".repeat(64);
    let reply = send(
        &app,
        form(
            "/token",
            &[
                ("grant_type", "authorization_code"),
                ("code", code.as_str()),
                ("redirect_uri", CLIENT_REDIRECT),
                ("code_verifier", wrong_verifier.as_str()),
                ("client_id", client_id.as_str()),
            ],
        ),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["error"], "invalid_grant");

    // A failed verification does not burn the code.
    let reply = exchange(&app, &client_id, &code).await;
    assert_eq!(reply.status, StatusCode::OK);
}

#[tokio::test]
async fn test_token_rejects_redirect_mismatch() {
    let (app, _server) = setup().await;
    let client_id = register(&app, &[CLIENT_REDIRECT]).await;
    let code = obtain_code(&app, &client_id, Some(CLIENT_REDIRECT)).await;

    let reply = send(
        &app,
        form(
            "/token",
            &[
                ("grant_type", "authorization_code"),
                ("code", code.as_str()),
                ("redirect_uri", "https://client.example.com/elsewhere"),
                ("code_verifier", CODE_VERIFIER),
                ("client_id", client_id.as_str()),
            ],
        ),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["error"], "invalid_request");
}

#[tokio::test]
async fn test_token_rejects_unknown_client() {
    let (app, _server) = setup().await;

    let reply = exchange(&app, "unknown-client", "mcp_code_whatever").await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.json()["error"], "invalid_client");
}

#[tokio::test]
async fn test_code_bound_to_issuing_client() {
    let (app, _server) = setup().await;
    let owner = register(&app, &[CLIENT_REDIRECT]).await;
    let other = register(&app, &[CLIENT_REDIRECT]).await;
    let code = obtain_code(&app, &owner, Some(CLIENT_REDIRECT)).await;

    let reply = exchange(&app, &other, &code).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["error"], "invalid_grant");
}

#[tokio::test]
async fn test_refresh_grant_unsupported() {
    let (app, _server) = setup().await;
    let client_id = register(&app, &[CLIENT_REDIRECT]).await;

    let reply = send(
        &app,
        form(
            "/token",
            &[
                ("grant_type", "refresh_token"),
                ("refresh_token", "anything"),
                ("client_id", client_id.as_str()),
            ],
        ),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["error"], "unsupported_grant_type");
}

// =============================================================================
// Bearer Boundary
// =============================================================================

#[tokio::test]
async fn test_mcp_requires_bearer() {
    let (app, _server) = setup().await;
    let ping = json!({"jsonrpc": "2.0", "id": 1, "method": "ping"});

    for token in [None, Some("mcp_token_forged"), Some(UPSTREAM_TOKEN)] {
        let reply = send(&app, mcp(token, ping.clone())).await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED, "{token:?}");
        let challenge = reply.headers[header::WWW_AUTHENTICATE].to_str().unwrap();
        assert_eq!(
            challenge,
            r#"Bearer resource_metadata="https://mcp.example.com/.well-known/oauth-protected-resource""#
        );
    }
}

#[tokio::test]
async fn test_revoked_token_is_rejected() {
    let (app, _server) = setup().await;
    let client_id = register(&app, &[CLIENT_REDIRECT]).await;
    let code = obtain_code(&app, &client_id, Some(CLIENT_REDIRECT)).await;
    let token = exchange(&app, &client_id, &code).await.json()["access_token"]
        .as_str()
        .unwrap()
        .to_string();

    let ping = json!({"jsonrpc": "2.0", "id": 1, "method": "ping"});
    assert_eq!(send(&app, mcp(Some(&token), ping.clone())).await.status, StatusCode::OK);

    let reply = send(&app, form("/revoke", &[("token", token.as_str())])).await;
    assert_eq!(reply.status, StatusCode::OK);

    assert_eq!(send(&app, mcp(Some(&token), ping)).await.status, StatusCode::UNAUTHORIZED);

    // Revoking again, or revoking garbage, is still 200.
    assert_eq!(send(&app, form("/revoke", &[("token", token.as_str())])).await.status, StatusCode::OK);
    assert_eq!(send(&app, form("/revoke", &[("token", "junk")])).await.status, StatusCode::OK);
}

// =============================================================================
// MCP Endpoint
// =============================================================================

async fn signed_in() -> (axum::Router, MockServer, String) {
    let (app, server) = setup().await;
    let client_id = register(&app, &[CLIENT_REDIRECT]).await;
    let code = obtain_code(&app, &client_id, Some(CLIENT_REDIRECT)).await;
    let token = exchange(&app, &client_id, &code).await.json()["access_token"]
        .as_str()
        .unwrap()
        .to_string();
    (app, server, token)
}

#[tokio::test]
async fn test_initialize_and_tools_list() {
    let (app, _server, token) = signed_in().await;

    let reply = send(
        &app,
        mcp(
            Some(&token),
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
        ),
    )
    .await;
    let json = reply.json();
    assert_eq!(json["id"], 1);
    assert_eq!(json["result"]["serverInfo"]["name"], "Fulcra Context Agent");
    assert!(json["result"]["instructions"].as_str().unwrap().contains("time zone"));

    let reply = send(
        &app,
        mcp(Some(&token), json!({"jsonrpc": "2.0", "id": "list", "method": "tools/list"})),
    )
    .await;
    let json = reply.json();
    assert_eq!(json["id"], "list");
    let tools = json["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 7);
    assert!(tools.iter().all(|t| t["inputSchema"]["type"] == "object"));
}

#[tokio::test]
async fn test_unknown_method_and_tool() {
    let (app, _server, token) = signed_in().await;

    let reply = send(
        &app,
        mcp(Some(&token), json!({"jsonrpc": "2.0", "id": 1, "method": "resources/list"})),
    )
    .await;
    assert_eq!(reply.json()["error"]["code"], -32601);

    let reply = send(
        &app,
        mcp(
            Some(&token),
            json!({
                "jsonrpc": "2.0",
                "id": 2,
                "method": "tools/call",
                "params": {"name": "get_weather", "arguments": {}}
            }),
        ),
    )
    .await;
    assert_eq!(reply.json()["error"]["code"], -32602);
}

#[tokio::test]
async fn test_notification_is_accepted_without_body() {
    let (app, _server, token) = signed_in().await;

    let reply = send(
        &app,
        mcp(Some(&token), json!({"jsonrpc": "2.0", "method": "notifications/initialized"})),
    )
    .await;
    assert_eq!(reply.status, StatusCode::ACCEPTED);
    assert!(reply.body.is_empty());
}

#[tokio::test]
async fn test_tool_call_without_id_runs_but_is_not_answered() {
    let (app, server, token) = signed_in().await;

    Mock::given(method("GET"))
        .and(path("/user/v1alpha1/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "Ada"})))
        .expect(1)
        .mount(&server)
        .await;

    let reply = send(
        &app,
        mcp(
            Some(&token),
            json!({
                "jsonrpc": "2.0",
                "method": "tools/call",
                "params": {"name": "get_user_info"}
            }),
        ),
    )
    .await;
    assert_eq!(reply.status, StatusCode::ACCEPTED);
    assert!(reply.body.is_empty());
}

#[tokio::test]
async fn test_batch_returns_responses_for_requests_only() {
    let (app, _server, token) = signed_in().await;

    let reply = send(
        &app,
        mcp(
            Some(&token),
            json!([
                {"jsonrpc": "2.0", "id": 1, "method": "ping"},
                {"jsonrpc": "2.0", "method": "notifications/initialized"},
                {"jsonrpc": "2.0", "id": 2, "method": "tools/list"}
            ]),
        ),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    let json = reply.json();
    let responses = json.as_array().unwrap();
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["id"], 1);
    assert_eq!(responses[1]["id"], 2);
}

#[tokio::test]
async fn test_tool_error_when_data_api_rejects_credential() {
    let (app, server, token) = signed_in().await;

    Mock::given(method("GET"))
        .and(path("/user/v1alpha1/info"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let reply = send(
        &app,
        mcp(
            Some(&token),
            json!({
                "jsonrpc": "2.0",
                "id": 9,
                "method": "tools/call",
                "params": {"name": "get_user_info"}
            }),
        ),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    let json = reply.json();
    assert_eq!(json["error"]["code"], -32000);
    assert!(json["error"]["message"].as_str().unwrap().contains("re-authorize"));
}
