//! Shared test helpers for adapter tests.

use async_trait::async_trait;
use lifechat_core::error::ToolError;
use lifechat_core::tool::ToolResult;
use std::sync::Mutex;
use crate::calendar::CalendarBackend;

/// A calendar backend that records every call and replays one result.
pub struct RecordingBackend {
    result: ToolResult,
    calls: Mutex<Vec<(String, serde_json::Value, String)>>,
}

impl RecordingBackend {
    pub fn succeeding(data: serde_json::Value) -> Self {
        Self {
            result: ToolResult::ok(data),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: &str) -> Self {
        Self {
            result: ToolResult::failed(error),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// `(function, input, account_id)` of the most recent call.
    pub fn last_call(&self) -> (String, serde_json::Value, String) {
        self.calls
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("backend was never called")
    }
}

#[async_trait]
impl CalendarBackend for RecordingBackend {
    async fn execute(
        &self,
        function: &str,
        input: serde_json::Value,
        account_id: &str,
    ) -> Result<ToolResult, ToolError> {
        self.calls
            .lock()
            .unwrap()
            .push((function.to_string(), input, account_id.to_string()));
        Ok(self.result.clone())
    }
}
