//! Tool trait: the abstraction over adapter capabilities.
//!
//! Tools are what let the model act: insert or list calendar entries, and
//! record how the user feels. Each adapter declares a name, a JSON parameter
//! schema, and an execution function.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use crate::error::ToolError;
use crate::provider::ToolDefinition;

/// A decoded request to execute a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call ID (matches the LLM's tool_call.id)
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Arguments as a JSON object
    pub arguments: serde_json::Value,
}

/// The result of a tool execution, as seen by the model.
///
/// Serialized verbatim into the tool-result message of the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the tool executed successfully
    pub success: bool,

    /// Structured payload returned by the service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    /// Failure description when `success` is false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// JSON text for the transcript.
    pub fn to_transcript_content(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"success":false,"error":"unserializable tool result: {e}"}}"#)
        })
    }
}

/// Per-turn execution context handed to every adapter.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// The external account the calendar adapters act on behalf of
    pub account_id: String,

    /// The turn's notion of "now", in the configured timezone
    pub now: DateTime<Tz>,
}

impl ToolContext {
    pub fn new(account_id: impl Into<String>, now: DateTime<Tz>) -> Self {
        Self {
            account_id: account_id.into(),
            now,
        }
    }

    /// "Now" as a naive local timestamp (the canonical storage format).
    pub fn local_now(&self) -> NaiveDateTime {
        self.now.naive_local()
    }

    pub fn timezone(&self) -> Tz {
        self.now.timezone()
    }
}

/// The core Tool trait.
///
/// Each adapter (calendar_insert, calendar_list, feeling_extract) implements
/// this trait and is registered once at startup.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "calendar_insert").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments.
    ///
    /// Service failures are reported as `Ok(ToolResult { success: false, .. })`;
    /// `Err` is reserved for calls that never reached the service.
    async fn execute(
        &self,
        arguments: serde_json::Value,
        context: &ToolContext,
    ) -> std::result::Result<ToolResult, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// Read a required string argument.
pub fn required_str<'a>(arguments: &'a serde_json::Value, key: &str) -> Result<&'a str, ToolError> {
    arguments
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ToolError::InvalidArguments(format!("Missing '{key}' argument")))
}
