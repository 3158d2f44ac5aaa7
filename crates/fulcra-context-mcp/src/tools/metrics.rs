//! Metric tools: get_metric_time_series.

use serde_json::json;

use super::{McpTool, ToolContext, render, schema};
use crate::error::{ToolError, ToolResult};
use crate::models::MetricTimeSeriesInput;

/// Time series of a single metric.
pub struct MetricTimeSeriesTool;

#[async_trait::async_trait]
impl McpTool for MetricTimeSeriesTool {
    fn name(&self) -> &'static str {
        "get_metric_time_series"
    }

    fn description(&self) -> &'static str {
        "Get samples of one metric (from get_metrics_catalog) over a period of time, \
         optionally resampled and aggregated."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "metric_name": {
                    "type": "string",
                    "description": "Metric name from get_metrics_catalog"
                },
                "start_time": schema::timestamp("Start of the period."),
                "end_time": schema::timestamp("End of the period."),
                "sample_rate": schema::number("Seconds per sample"),
                "replace_nulls": schema::boolean("Replace missing samples with 0"),
                "calculations": schema::list(
                    "string",
                    "Aggregations per sample, e.g. [\"max\", \"min\", \"delta\"]"
                )
            },
            "required": ["metric_name", "start_time", "end_time"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, input: serde_json::Value) -> ToolResult<String> {
        let params: MetricTimeSeriesInput = serde_json::from_value(input)?;

        if params.metric_name.trim().is_empty() {
            return Err(ToolError::validation("metric_name", "must not be empty"));
        }
        if params.end_time < params.start_time {
            return Err(ToolError::validation("end_time", "must not be before start_time"));
        }
        if params.sample_rate.is_some_and(|r| r <= 0.0) {
            return Err(ToolError::validation("sample_rate", "must be positive"));
        }

        let series = ctx
            .client
            .metric_time_series(&params, &ctx.credential)
            .await
            .map_err(ToolError::from)?;

        render(
            &format!(
                "{} between {} and {}",
                params.metric_name, params.start_time, params.end_time
            ),
            &series,
        )
    }
}
