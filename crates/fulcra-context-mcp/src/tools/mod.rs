//! MCP tool implementations.
//!
//! Each tool module provides tools that:
//! 1. Parse and validate input parameters (leniently, see [`crate::models::lenient`])
//! 2. Call the Fulcra data API on behalf of the signed-in user
//! 3. Return the API's JSON under a one-line description

mod activity;
mod location;
mod metrics;
mod profile;
pub mod schema;

pub use activity::*;
pub use location::*;
pub use metrics::*;
pub use profile::*;

use std::sync::Arc;

use crate::client::FulcraClient;
use crate::error::ToolResult;
use crate::server::oauth::UpstreamCredential;

/// Tool execution context, built per request.
pub struct ToolContext {
    /// API client.
    pub client: Arc<FulcraClient>,

    /// Credential of the user the request was authenticated as.
    pub credential: UpstreamCredential,
}

impl ToolContext {
    /// Create a new tool context.
    #[must_use]
    pub fn new(client: Arc<FulcraClient>, credential: UpstreamCredential) -> Self {
        Self { client, credential }
    }
}

/// Trait for MCP tools.
#[async_trait::async_trait]
pub trait McpTool: Send + Sync {
    /// Tool name (e.g., "get_workouts").
    fn name(&self) -> &'static str;

    /// Tool description for LLM.
    fn description(&self) -> &'static str;

    /// JSON Schema for input parameters.
    fn input_schema(&self) -> serde_json::Value;

    /// Execute the tool with given input.
    async fn execute(&self, ctx: &ToolContext, input: serde_json::Value) -> ToolResult<String>;
}

/// Prefix the pretty-printed API payload with a short description of what it is.
fn render(label: &str, value: &serde_json::Value) -> ToolResult<String> {
    Ok(format!("{label}: {}", serde_json::to_string_pretty(value)?))
}

/// Register all tools.
#[must_use]
pub fn register_all_tools() -> Vec<Box<dyn McpTool>> {
    vec![
        // Profile tools (2)
        Box::new(profile::UserInfoTool),
        Box::new(profile::MetricsCatalogTool),
        // Metric tools (1)
        Box::new(metrics::MetricTimeSeriesTool),
        // Activity tools (2)
        Box::new(activity::WorkoutsTool),
        Box::new(activity::SleepCyclesTool),
        // Location tools (2)
        Box::new(location::LocationAtTimeTool),
        Box::new(location::LocationTimeSeriesTool),
    ]
}
