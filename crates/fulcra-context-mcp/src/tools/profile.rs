//! Profile tools: get_user_info, get_metrics_catalog.

use serde_json::json;

use super::{McpTool, ToolContext, render};
use crate::error::{ToolError, ToolResult};

/// Signed-in user's profile.
pub struct UserInfoTool;

#[async_trait::async_trait]
impl McpTool for UserInfoTool {
    fn name(&self) -> &'static str {
        "get_user_info"
    }

    fn description(&self) -> &'static str {
        "Get the profile of the Fulcra user, including their preferred time zone. \
         Call this first to learn how to express times for the other tools."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, ctx: &ToolContext, _input: serde_json::Value) -> ToolResult<String> {
        let info = ctx.client.user_info(&ctx.credential).await.map_err(ToolError::from)?;
        render("User info", &info)
    }
}

/// Catalog of available metrics.
pub struct MetricsCatalogTool;

#[async_trait::async_trait]
impl McpTool for MetricsCatalogTool {
    fn name(&self) -> &'static str {
        "get_metrics_catalog"
    }

    fn description(&self) -> &'static str {
        "List the metrics available for the user (steps, heart rate, ...). \
         Use a metric name from this list with get_metric_time_series."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, ctx: &ToolContext, _input: serde_json::Value) -> ToolResult<String> {
        let catalog = ctx.client.metrics_catalog(&ctx.credential).await.map_err(ToolError::from)?;
        render("Available metrics", &catalog)
    }
}
