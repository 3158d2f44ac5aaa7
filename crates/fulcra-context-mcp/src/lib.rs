//! Fulcra Context MCP Server
//!
//! A Model Context Protocol (MCP) server that gives LLM agents access to a
//! user's Fulcra personal data (workouts, sleep, metrics, location).
//!
//! # Features
//!
//! - **7 MCP Tools**: profile, metrics catalog, metric time series, workouts,
//!   sleep cycles, and location lookups
//! - **OAuth token relay**: clients authenticate with locally issued tokens;
//!   the Fulcra (Auth0) credential never leaves the server
//! - **Lenient inputs**: string-encoded booleans, numbers, and lists accepted
//! - **Cached**: short per-user TTL cache reduces API calls
//!
//! # Example
//!
//! ```no_run
//! use fulcra_context_mcp::{config::Config, server::McpServer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     McpServer::new(config)?.run_http(4449).await
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod server;
pub mod tools;

pub use client::FulcraClient;
pub use config::Config;
pub use error::{ClientError, OAuthError, ToolError};
