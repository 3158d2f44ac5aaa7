//! Location tools: get_location_at_time, get_location_time_series.

use serde_json::json;

use super::{McpTool, ToolContext, render, schema};
use crate::error::{ToolError, ToolResult};
use crate::models::{DEFAULT_LOCATION_WINDOW, LocationAtTimeInput, LocationTimeSeriesInput};

/// Where the user was at a point in time.
pub struct LocationAtTimeTool;

#[async_trait::async_trait]
impl McpTool for LocationAtTimeTool {
    fn name(&self) -> &'static str {
        "get_location_at_time"
    }

    fn description(&self) -> &'static str {
        "Get the user's location closest to a point in time."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "time": schema::timestamp("The point in time."),
                "window_size": schema::integer(
                    "Seconds around the time to search for a sample",
                    Some(DEFAULT_LOCATION_WINDOW)
                ),
                "include_after": schema::boolean("Also consider samples after the time"),
                "reverse_geocode": schema::boolean("Resolve coordinates to an address")
            },
            "required": ["time"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, input: serde_json::Value) -> ToolResult<String> {
        let params: LocationAtTimeInput = serde_json::from_value(input)?;

        let location = ctx
            .client
            .location_at_time(&params, &ctx.credential)
            .await
            .map_err(ToolError::from)?;

        render(&format!("Location at {}", params.time), &location)
    }
}

/// Location samples over a period.
pub struct LocationTimeSeriesTool;

#[async_trait::async_trait]
impl McpTool for LocationTimeSeriesTool {
    fn name(&self) -> &'static str {
        "get_location_time_series"
    }

    fn description(&self) -> &'static str {
        "Get the user's locations over a period of time, reporting a new sample \
         when they moved far enough."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "start_time": schema::timestamp("Start of the period."),
                "end_time": schema::timestamp("End of the period."),
                "change_meters": schema::number("Minimum movement in meters between samples"),
                "sample_rate": schema::integer("Seconds per sample", None),
                "look_back": schema::integer(
                    "Seconds before start_time to search for the initial location",
                    Some(DEFAULT_LOCATION_WINDOW)
                ),
                "reverse_geocode": schema::boolean("Resolve coordinates to addresses")
            },
            "required": ["start_time", "end_time"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, input: serde_json::Value) -> ToolResult<String> {
        let params: LocationTimeSeriesInput = serde_json::from_value(input)?;

        if params.end_time < params.start_time {
            return Err(ToolError::validation("end_time", "must not be before start_time"));
        }
        if params.change_meters.is_some_and(|m| m < 0.0) {
            return Err(ToolError::validation("change_meters", "must not be negative"));
        }

        let series = ctx
            .client
            .location_time_series(&params, &ctx.credential)
            .await
            .map_err(ToolError::from)?;

        render(
            &format!("Locations between {} and {}", params.start_time, params.end_time),
            &series,
        )
    }
}
