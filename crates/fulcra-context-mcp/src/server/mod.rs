//! MCP server implementation.
//!
//! One HTTP listener serves both the OAuth token relay and the MCP endpoint.
//! State lives in process memory: a restart signs every client out.

pub mod auth;
pub mod oauth;
pub mod transport;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;

use self::oauth::{Auth0Provider, MemoryStore, OAuthProxy};
use crate::client::FulcraClient;
use crate::config::Config;
use crate::tools::{self, McpTool};

/// MCP server for Fulcra personal data.
pub struct McpServer {
    /// Data API client shared by all tool calls.
    client: Arc<FulcraClient>,

    /// OAuth token relay.
    proxy: Arc<OAuthProxy>,

    /// Registered tools.
    tools: Vec<Box<dyn McpTool>>,

    config: Config,
}

impl McpServer {
    /// Create a new MCP server with in-memory credential storage.
    ///
    /// # Errors
    ///
    /// Returns error if an HTTP client cannot be built.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let client = Arc::new(FulcraClient::new(&config)?);
        let provider = Arc::new(Auth0Provider::new(config.oidc.clone())?);
        let proxy = Arc::new(OAuthProxy::new(
            Arc::new(MemoryStore::new()),
            provider,
            config.callback_url(),
            config.oidc.scopes.clone(),
        ));

        Ok(Self { client, proxy, tools: tools::register_all_tools(), config })
    }

    /// The token relay, e.g. for inspecting store statistics.
    #[must_use]
    pub fn proxy(&self) -> &Arc<OAuthProxy> {
        &self.proxy
    }

    /// List all available tools.
    #[must_use]
    pub fn list_tools(&self) -> Vec<(&str, &str)> {
        self.tools.iter().map(|t| (t.name(), t.description())).collect()
    }

    /// Build the HTTP router, consuming the server.
    #[must_use]
    pub fn into_router(self) -> Router {
        transport::create_router(self.tools, self.client, self.proxy, &self.config.base_url)
    }

    /// Run the server in HTTP mode.
    ///
    /// # Errors
    ///
    /// Returns error on server failure.
    pub async fn run_http(self, port: u16) -> anyhow::Result<()> {
        tracing::info!("Starting MCP server in HTTP mode on port {}", port);
        tracing::info!("Registered {} tools", self.tools.len());
        tracing::info!(base_url = %self.config.base_url, callback = %self.config.callback_url(), "OAuth relay configured");

        match self.config.sweep_interval {
            Some(interval) if !interval.is_zero() => {
                Arc::clone(&self.proxy).start_cleanup_task(interval);
            }
            _ => tracing::info!("Expired-credential sweep disabled"),
        }

        let router = self.into_router();
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        tracing::info!("HTTP server listening on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;

        tracing::info!("HTTP server shut down");
        Ok(())
    }
}

impl std::fmt::Debug for McpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpServer")
            .field("tools", &self.tools.len())
            .field("config", &self.config)
            .finish()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Received shutdown signal");
}
