//! calendar_list: read the user's calendar for a time window.

use async_trait::async_trait;
use lifechat_core::error::ToolError;
use lifechat_core::tool::{Tool, ToolContext, ToolResult, required_str};
use std::sync::Arc;
use crate::calendar::{CalendarBackend, EVENTS_LIST, to_rfc3339};

pub struct CalendarListTool {
    backend: Arc<dyn CalendarBackend>,
    calendar_id: String,
}

impl CalendarListTool {
    pub fn new(backend: Arc<dyn CalendarBackend>, calendar_id: impl Into<String>) -> Self {
        Self {
            backend,
            calendar_id: calendar_id.into(),
        }
    }

    fn function_input(
        &self,
        arguments: &serde_json::Value,
        context: &ToolContext,
    ) -> Result<serde_json::Value, ToolError> {
        let tz = context.timezone();
        let time_min = to_rfc3339(required_str(arguments, "time_min")?, tz)?;
        let time_max = to_rfc3339(required_str(arguments, "time_max")?, tz)?;

        let (min, max) = (
            chrono::DateTime::parse_from_rfc3339(&time_min),
            chrono::DateTime::parse_from_rfc3339(&time_max),
        );
        if let (Ok(min), Ok(max)) = (min, max) {
            if max < min {
                return Err(ToolError::InvalidArguments(format!(
                    "time_max ({time_max}) is before time_min ({time_min})"
                )));
            }
        }

        Ok(serde_json::json!({
            "path": { "calendarId": self.calendar_id },
            "query": {
                "timeMin": time_min,
                "timeMax": time_max,
                "singleEvents": true,
                "orderBy": "startTime",
            }
        }))
    }
}

#[async_trait]
impl Tool for CalendarListTool {
    fn name(&self) -> &str {
        "calendar_list"
    }

    fn description(&self) -> &str {
        "List the events in the user's calendar between two points in time. \
         Use this to check what is already planned before answering."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "time_min": {
                    "type": "string",
                    "description": "Window start, ISO-8601 (e.g. 2025-06-01T00:00:00+02:00)"
                },
                "time_max": {
                    "type": "string",
                    "description": "Window end, ISO-8601"
                }
            },
            "required": ["time_min", "time_max"]
        })
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        context: &ToolContext,
    ) -> Result<ToolResult, ToolError> {
        let input = self.function_input(&arguments, context)?;
        self.backend.execute(EVENTS_LIST, input, &context.account_id).await
    }
}
