//! Activity tools: get_workouts, get_sleep_cycles.

use serde_json::json;

use super::{McpTool, ToolContext, render, schema};
use crate::error::{ToolError, ToolResult};
use crate::models::{SleepCyclesInput, WorkoutsInput};

/// Workouts recorded in a period.
pub struct WorkoutsTool;

#[async_trait::async_trait]
impl McpTool for WorkoutsTool {
    fn name(&self) -> &'static str {
        "get_workouts"
    }

    fn description(&self) -> &'static str {
        "Get details about the workouts that the user has done during a period of time."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "start_time": schema::timestamp("The starting time of the period in question."),
                "end_time": schema::timestamp("The ending time of the period in question.")
            },
            "required": ["start_time", "end_time"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, input: serde_json::Value) -> ToolResult<String> {
        let params: WorkoutsInput = serde_json::from_value(input)?;

        if params.end_time < params.start_time {
            return Err(ToolError::validation("end_time", "must not be before start_time"));
        }

        let workouts =
            ctx.client.workouts(&params, &ctx.credential).await.map_err(ToolError::from)?;

        render(
            &format!("Workouts during {} and {}", params.start_time, params.end_time),
            &workouts,
        )
    }
}

/// Sleep cycles in a period.
pub struct SleepCyclesTool;

#[async_trait::async_trait]
impl McpTool for SleepCyclesTool {
    fn name(&self) -> &'static str {
        "get_sleep_cycles"
    }

    fn description(&self) -> &'static str {
        "Get the user's sleep cycles during a period of time, built from sleep stage samples."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "start_time": schema::timestamp("Start of the period."),
                "end_time": schema::timestamp("End of the period."),
                "cycle_gap": {
                    "type": "string",
                    "description": "Minimum gap between two cycles (ISO 8601 duration or seconds)"
                },
                "stages": schema::list("integer", "Sleep stage codes to include"),
                "gap_stages": schema::list("integer", "Sleep stage codes treated as gaps"),
                "clip_to_range": schema::boolean("Clip cycles to the requested period")
            },
            "required": ["start_time", "end_time"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, input: serde_json::Value) -> ToolResult<String> {
        let params: SleepCyclesInput = serde_json::from_value(input)?;

        if params.end_time < params.start_time {
            return Err(ToolError::validation("end_time", "must not be before start_time"));
        }

        let cycles =
            ctx.client.sleep_cycles(&params, &ctx.credential).await.map_err(ToolError::from)?;

        render(
            &format!("Sleep cycles between {} and {}", params.start_time, params.end_time),
            &cycles,
        )
    }
}
