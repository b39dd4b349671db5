//! calendar_insert: create an event on the user's calendar.

use async_trait::async_trait;
use lifechat_core::error::ToolError;
use lifechat_core::record::parse_local_timestamp;
use lifechat_core::tool::{Tool, ToolContext, ToolResult, required_str};
use std::sync::Arc;
use crate::calendar::{CalendarBackend, EVENTS_INSERT};

pub struct CalendarInsertTool {
    backend: Arc<dyn CalendarBackend>,
    calendar_id: String,
}

impl CalendarInsertTool {
    pub fn new(backend: Arc<dyn CalendarBackend>, calendar_id: impl Into<String>) -> Self {
        Self {
            backend,
            calendar_id: calendar_id.into(),
        }
    }

    /// Build the service's `function_input` from the model's arguments.
    fn function_input(
        &self,
        arguments: &serde_json::Value,
        context: &ToolContext,
    ) -> Result<serde_json::Value, ToolError> {
        let summary = required_str(arguments, "summary")?;
        let (start, start_tz) = time_argument(arguments, "start")?;
        let (end, end_tz) = time_argument(arguments, "end")?;

        let fallback_tz = context.timezone().name().to_string();
        let timezone = arguments
            .get("timezone")
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
            .or(start_tz.clone())
            .unwrap_or(fallback_tz);

        let parsed_start = parse_local_timestamp(&start)
            .map_err(|e| ToolError::InvalidArguments(format!("start: {e}")))?;
        let parsed_end = parse_local_timestamp(&end)
            .map_err(|e| ToolError::InvalidArguments(format!("end: {e}")))?;
        if parsed_end < parsed_start {
            return Err(ToolError::InvalidArguments(format!(
                "end ({end}) is before start ({start})"
            )));
        }

        Ok(serde_json::json!({
            "path": { "calendarId": self.calendar_id },
            "body": {
                "summary": summary,
                "start": { "dateTime": start, "timeZone": start_tz.unwrap_or_else(|| timezone.clone()) },
                "end": { "dateTime": end, "timeZone": end_tz.unwrap_or(timezone) },
            }
        }))
    }
}

/// Read `start`/`end` either as a plain timestamp string or as the
/// calendar-native `{dateTime, timeZone}` object.
fn time_argument(
    arguments: &serde_json::Value,
    key: &str,
) -> Result<(String, Option<String>), ToolError> {
    match arguments.get(key) {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Ok((s.trim().to_string(), None)),
        Some(serde_json::Value::Object(obj)) => {
            let date_time = obj
                .get("dateTime")
                .and_then(|v| v.as_str())
                .ok_or_else(|| ToolError::InvalidArguments(format!("Missing '{key}.dateTime'")))?;
            let tz = obj.get("timeZone").and_then(|v| v.as_str()).map(str::to_string);
            Ok((date_time.to_string(), tz))
        }
        _ => Err(ToolError::InvalidArguments(format!("Missing '{key}' argument"))),
    }
}

#[async_trait]
impl Tool for CalendarInsertTool {
    fn name(&self) -> &str {
        "calendar_insert"
    }

    fn description(&self) -> &str {
        "Create an event in the user's calendar for something they did or plan to do. \
         Use ISO-8601 local times (e.g. 2025-06-15T08:00:00) and an IANA timezone."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "summary": {
                    "type": "string",
                    "description": "Short title of the event, e.g. 'Dinner with friends'"
                },
                "start": {
                    "type": "string",
                    "description": "Start time, ISO-8601"
                },
                "end": {
                    "type": "string",
                    "description": "End time, ISO-8601, not before start"
                },
                "timezone": {
                    "type": "string",
                    "description": "IANA timezone of start and end, e.g. 'Europe/Berlin'"
                }
            },
            "required": ["summary", "start", "end", "timezone"]
        })
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        context: &ToolContext,
    ) -> Result<ToolResult, ToolError> {
        let input = self.function_input(&arguments, context)?;
        self.backend
            .execute(EVENTS_INSERT, input, &context.account_id)
            .await
    }
}
