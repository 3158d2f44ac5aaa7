//! HTTP transport.
//!
//! Serves the MCP Streamable HTTP endpoint (JSON responses only) behind the
//! bearer boundary, plus the OAuth endpoints that issue the bearer tokens.

use std::borrow::Cow;
use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::auth;
use super::oauth::{OAuthProxy, UpstreamCredential, handlers};
use crate::client::FulcraClient;
use crate::tools::{McpTool, ToolContext};

/// Server name announced in `initialize`.
pub const SERVER_NAME: &str = "Fulcra Context Agent";

/// Instructions announced in `initialize`.
pub const SERVER_INSTRUCTIONS: &str = "This server provides personal data retrieval tools. \
Always specify the time zone when using times as parameters.";

/// Protocol version assumed when the client does not send one.
const DEFAULT_PROTOCOL_VERSION: &str = "2025-03-26";

/// JSON-RPC 2.0 request.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
    #[serde(default)]
    pub id: Option<serde_json::Value>,
}

/// A single request or a batch.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcMessage {
    Single(JsonRpcRequest),
    Batch(Vec<JsonRpcRequest>),
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: Cow<'static, str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 error.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// JSON-RPC and MCP error codes.
pub mod error_codes {
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const TOOL_ERROR: i32 = -32000;
}

impl JsonRpcResponse {
    /// JSON-RPC version constant.
    const VERSION: &'static str = "2.0";

    #[must_use]
    pub fn success(id: Option<serde_json::Value>, result: serde_json::Value) -> Self {
        Self { jsonrpc: Cow::Borrowed(Self::VERSION), result: Some(result), error: None, id }
    }

    #[must_use]
    pub fn error(id: Option<serde_json::Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: Cow::Borrowed(Self::VERSION),
            result: None,
            error: Some(JsonRpcError { code, message: message.into(), data: None }),
            id,
        }
    }
}

/// MCP tool info for tools/list response.
#[derive(Debug, Serialize)]
pub struct McpToolInfo {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

/// Shared state for HTTP handlers.
pub struct HttpState {
    pub tools: Vec<Box<dyn McpTool>>,
    pub client: Arc<FulcraClient>,
    pub proxy: Arc<OAuthProxy>,
    /// Public base URL, without trailing slash.
    pub base_url: String,
}

/// Create the HTTP router for MCP.
pub fn create_router(
    tools: Vec<Box<dyn McpTool>>,
    client: Arc<FulcraClient>,
    proxy: Arc<OAuthProxy>,
    base_url: &str,
) -> Router {
    let state = Arc::new(HttpState {
        tools,
        client,
        proxy,
        base_url: base_url.trim_end_matches('/').to_string(),
    });

    let protected = Router::new()
        .route("/mcp", post(handle_mcp_post))
        .route_layer(middleware::from_fn_with_state(Arc::clone(&state), auth::require_bearer));

    Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        // OAuth discovery (RFC 9728 also allows the resource path as suffix)
        .route("/.well-known/oauth-protected-resource", get(handlers::handle_protected_resource))
        .route(
            "/.well-known/oauth-protected-resource/mcp",
            get(handlers::handle_protected_resource),
        )
        .route(
            "/.well-known/oauth-authorization-server",
            get(handlers::handle_auth_server_metadata),
        )
        // OAuth endpoints
        .route("/register", post(handlers::handle_register))
        .route("/authorize", get(handlers::handle_authorize_get))
        .route("/callback", get(handlers::handle_callback))
        .route("/token", post(handlers::handle_token))
        .route("/revoke", post(handlers::handle_revoke))
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "fulcra-context-mcp",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn readiness_check(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let stats = state.proxy.stats().await;
    Json(serde_json::json!({
        "status": "ready",
        "service": "fulcra-context-mcp",
        "version": env!("CARGO_PKG_VERSION"),
        "tools": state.tools.len(),
        "clients": stats.clients,
        "active_tokens": stats.tokens
    }))
}

/// Handle POST requests to /mcp (Streamable HTTP transport)
async fn handle_mcp_post(
    State(state): State<Arc<HttpState>>,
    Extension(credential): Extension<UpstreamCredential>,
    Json(message): Json<JsonRpcMessage>,
) -> Response {
    match message {
        JsonRpcMessage::Single(req) => {
            match handle_request(&state, &credential, req).await {
                Some(response) => Json(response).into_response(),
                None => StatusCode::ACCEPTED.into_response(),
            }
        }
        JsonRpcMessage::Batch(requests) => {
            if requests.is_empty() {
                return Json(JsonRpcResponse::error(
                    None,
                    error_codes::INVALID_REQUEST,
                    "Empty batch",
                ))
                .into_response();
            }

            let responses: Vec<JsonRpcResponse> = futures::future::join_all(
                requests.into_iter().map(|req| handle_request(&state, &credential, req)),
            )
            .await
            .into_iter()
            .flatten()
            .collect();

            if responses.is_empty() {
                StatusCode::ACCEPTED.into_response()
            } else {
                Json(responses).into_response()
            }
        }
    }
}

/// Dispatch one request. Notifications yield `None`.
async fn handle_request(
    state: &HttpState,
    credential: &UpstreamCredential,
    req: JsonRpcRequest,
) -> Option<JsonRpcResponse> {
    tracing::debug!(method = %req.method, "Handling MCP request");

    let is_notification = req.id.is_none();

    if req.jsonrpc != "2.0" {
        if is_notification {
            return None;
        }
        return Some(JsonRpcResponse::error(
            req.id,
            error_codes::INVALID_REQUEST,
            "jsonrpc must be \"2.0\"",
        ));
    }

    let response = match req.method.as_str() {
        "initialize" => JsonRpcResponse::success(req.id, handle_initialize(&req.params)),
        "tools/list" => handle_tools_list(req.id, &state.tools),
        "tools/call" => {
            let ctx = ToolContext::new(Arc::clone(&state.client), credential.clone());
            handle_tools_call(req.id, &req.params, &state.tools, &ctx).await
        }
        "ping" => JsonRpcResponse::success(req.id, serde_json::json!({})),
        _ if is_notification => return None,
        _ => JsonRpcResponse::error(
            req.id,
            error_codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", req.method),
        ),
    };

    // Notifications are dispatched but never answered.
    (!is_notification).then_some(response)
}

fn handle_initialize(params: &serde_json::Value) -> serde_json::Value {
    let protocol_version = params
        .get("protocolVersion")
        .and_then(|v| v.as_str())
        .unwrap_or(DEFAULT_PROTOCOL_VERSION);

    tracing::info!("MCP initialize: protocol version {}", protocol_version);

    serde_json::json!({
        "protocolVersion": protocol_version,
        "capabilities": {
            "tools": {
                "listChanged": false
            }
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION")
        },
        "instructions": SERVER_INSTRUCTIONS
    })
}

fn handle_tools_list(id: Option<serde_json::Value>, tools: &[Box<dyn McpTool>]) -> JsonRpcResponse {
    let tool_list: Vec<McpToolInfo> = tools
        .iter()
        .map(|t| McpToolInfo {
            name: t.name().to_string(),
            description: t.description().to_string(),
            input_schema: t.input_schema(),
        })
        .collect();

    JsonRpcResponse::success(
        id,
        serde_json::json!({
            "tools": tool_list
        }),
    )
}

async fn handle_tools_call(
    id: Option<serde_json::Value>,
    params: &serde_json::Value,
    tools: &[Box<dyn McpTool>],
    ctx: &ToolContext,
) -> JsonRpcResponse {
    let Some(tool_name) = params.get("name").and_then(|v| v.as_str()) else {
        return JsonRpcResponse::error(id, error_codes::INVALID_PARAMS, "Missing 'name' parameter");
    };

    let arguments = params.get("arguments").cloned().unwrap_or(serde_json::json!({}));

    let Some(tool) = tools.iter().find(|t| t.name() == tool_name) else {
        return JsonRpcResponse::error(
            id,
            error_codes::INVALID_PARAMS,
            format!("Tool not found: {tool_name}"),
        );
    };

    tracing::info!(tool = %tool_name, "Executing tool");

    match tool.execute(ctx, arguments).await {
        Ok(result) => JsonRpcResponse::success(
            id,
            serde_json::json!({
                "content": [{
                    "type": "text",
                    "text": result
                }]
            }),
        ),
        Err(e) => {
            tracing::warn!(tool = %tool_name, error = %e, "Tool execution failed");
            JsonRpcResponse::error(id, error_codes::TOOL_ERROR, e.to_user_message())
        }
    }
}
