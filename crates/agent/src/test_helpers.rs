//! Shared test helpers: scripted providers and stub calendar services.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone};
use chrono_tz::Tz;
use lifechat_core::error::{ProviderError, ToolError};
use lifechat_core::event::EventBus;
use lifechat_core::message::{Message, MessageToolCall};
use lifechat_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use lifechat_core::tool::ToolResult;
use lifechat_providers::LlmGateway;
use lifechat_tools::{CalendarBackend, ToolRegistry};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::turn::TurnRunner;

/// A mock provider that returns a sequence of scripted responses.
///
/// Each call to `complete` returns the next response in the queue and
/// records the request. Panics if more calls are made than responses provided.
pub struct SequentialMockProvider {
    responses: Mutex<Vec<ProviderResponse>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// First the given tool calls, then a final answer.
    pub fn tool_then_answer(tool_calls: Vec<MessageToolCall>, answer: &str) -> Self {
        Self::new(vec![
            make_tool_call_response(tool_calls),
            make_text_response(answer),
        ])
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        let n = requests.len();
        if n >= responses.len() {
            panic!(
                "SequentialMockProvider: no more responses (call #{n}, have {})",
                responses.len()
            );
        }
        requests.push(request);
        Ok(responses[n].clone())
    }
}

fn usage() -> Option<Usage> {
    Some(Usage {
        prompt_tokens: 10,
        completion_tokens: 5,
        total_tokens: 15,
    })
}

/// A plain text response (no tool calls).
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: usage(),
        model: "mock-model".into(),
    }
}

/// A response carrying only tool calls.
pub fn make_tool_call_response(tool_calls: Vec<MessageToolCall>) -> ProviderResponse {
    let mut msg = Message::assistant("");
    msg.tool_calls = tool_calls;
    ProviderResponse {
        message: msg,
        usage: usage(),
        model: "mock-model".into(),
    }
}

/// A wire-form tool call with JSON arguments.
pub fn make_tool_call(id: &str, name: &str, args: serde_json::Value) -> MessageToolCall {
    MessageToolCall {
        id: id.to_string(),
        name: name.to_string(),
        arguments: serde_json::to_string(&args).unwrap(),
    }
}

/// A calendar service stub that replays one result, optionally after a delay.
pub struct StubCalendar {
    result: ToolResult,
    delay: Option<Duration>,
    calls: Mutex<Vec<(String, serde_json::Value)>>,
}

impl StubCalendar {
    pub fn succeeding(data: serde_json::Value) -> Self {
        Self {
            result: ToolResult::ok(data),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: &str) -> Self {
        Self {
            result: ToolResult::failed(error),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// `(function, input)` in call order.
    pub fn calls(&self) -> Vec<(String, serde_json::Value)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CalendarBackend for StubCalendar {
    async fn execute(
        &self,
        function: &str,
        input: serde_json::Value,
        _account_id: &str,
    ) -> Result<ToolResult, ToolError> {
        self.calls
            .lock()
            .unwrap()
            .push((function.to_string(), input));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.result.clone())
    }
}

/// What the calendar service returns for a created event.
pub fn created_event(summary: &str, start: &str, end: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "evt_1",
        "status": "confirmed",
        "summary": summary,
        "start": {"dateTime": start, "timeZone": "Europe/Berlin"},
        "end": {"dateTime": end, "timeZone": "Europe/Berlin"}
    })
}

/// Sunday 15 June 2025, 21:00 in Berlin.
pub fn sunday_evening() -> DateTime<Tz> {
    chrono_tz::Europe::Berlin
        .with_ymd_and_hms(2025, 6, 15, 21, 0, 0)
        .unwrap()
}

/// A turn runner wired to the given provider and calendar stub.
pub fn runner(
    provider: Arc<SequentialMockProvider>,
    calendar: Arc<StubCalendar>,
    bus: Arc<EventBus>,
) -> TurnRunner {
    let gateway = Arc::new(LlmGateway::new(provider, "mock-model"));
    let tools = Arc::new(ToolRegistry::with_calendar(calendar, "primary"));
    TurnRunner::new(gateway, tools, bus).with_account_id("owner-1")
}
