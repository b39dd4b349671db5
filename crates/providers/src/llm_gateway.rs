//! LLM gateway: one request/response exchange with the model.
//!
//! Sends the transcript and the offered tools, then classifies the reply as
//! final text or a list of decoded tool calls. Tool calls with undecodable
//! arguments are dropped here and logged; they never reach an adapter.

use lifechat_core::error::{ArgumentDecodeError, GatewayError, ProviderError};
use lifechat_core::message::{MessageToolCall, Transcript};
use lifechat_core::provider::{Provider, ProviderRequest, ToolChoice, ToolDefinition};
use lifechat_core::tool::ToolCall;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// What the model answered.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// A final natural-language reply
    Text(String),
    /// Zero or more decoded tool calls; empty when every call was malformed
    ToolCalls(Vec<ToolCall>),
}

/// Wraps a provider with model selection, sampling settings and a deadline.
pub struct LlmGateway {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    timeout: Duration,
}

impl LlmGateway {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.3,
            max_tokens: None,
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Deadline for one exchange, retries included.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send `transcript` with `tools` and classify the reply.
    ///
    /// With `require_tool_use` the model is forced to call a tool and a reply
    /// without tool calls is a [`GatewayError::ToolSelection`]. Otherwise tool
    /// calls take precedence over text, and an empty reply is also a
    /// selection failure.
    pub async fn complete(
        &self,
        transcript: &Transcript,
        tools: &[ToolDefinition],
        require_tool_use: bool,
    ) -> Result<Completion, GatewayError> {
        if transcript.is_empty() {
            return Err(GatewayError::EmptyTranscript);
        }

        let tool_choice = match (tools.is_empty(), require_tool_use) {
            (true, _) => ToolChoice::None,
            (false, true) => ToolChoice::Required,
            (false, false) => ToolChoice::Auto,
        };

        let request = ProviderRequest {
            model: self.model.clone(),
            messages: transcript.messages.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: tools.to_vec(),
            tool_choice,
        };

        debug!(
            model = %self.model,
            messages = transcript.len(),
            tools = tools.len(),
            require_tool_use,
            "LLM exchange"
        );

        let response = tokio::time::timeout(self.timeout, self.provider.complete(request))
            .await
            .map_err(|_| {
                ProviderError::Timeout(format!(
                    "LLM call exceeded {}s",
                    self.timeout.as_secs()
                ))
            })??;

        let message = response.message;
        let raw_calls = message.tool_calls;

        if !raw_calls.is_empty() {
            let (calls, rejected) = decode_tool_calls(&raw_calls);
            for err in &rejected {
                warn!(
                    call_id = %err.call_id,
                    tool = %err.tool_name,
                    reason = %err.reason,
                    "Dropping tool call with malformed arguments"
                );
            }
            return Ok(Completion::ToolCalls(calls));
        }

        if require_tool_use {
            return Err(GatewayError::ToolSelection(
                "model answered without calling a tool".into(),
            ));
        }

        let text = message.content.trim();
        if text.is_empty() {
            return Err(GatewayError::ToolSelection(
                "model returned neither text nor tool calls".into(),
            ));
        }
        Ok(Completion::Text(text.to_string()))
    }
}

/// Decode wire-form tool calls.
///
/// Arguments must be a JSON object; an empty string counts as `{}`. Calls
/// that fail are returned separately and keep their original order.
pub fn decode_tool_calls(raw: &[MessageToolCall]) -> (Vec<ToolCall>, Vec<ArgumentDecodeError>) {
    let mut calls = Vec::with_capacity(raw.len());
    let mut rejected = Vec::new();

    for tc in raw {
        let reject = |reason: String| ArgumentDecodeError {
            call_id: tc.id.clone(),
            tool_name: tc.name.clone(),
            reason,
        };

        let text = tc.arguments.trim();
        let parsed = if text.is_empty() {
            Ok(serde_json::Value::Object(serde_json::Map::new()))
        } else {
            serde_json::from_str::<serde_json::Value>(text)
        };

        match parsed {
            Ok(arguments @ serde_json::Value::Object(_)) => calls.push(ToolCall {
                id: tc.id.clone(),
                name: tc.name.clone(),
                arguments,
            }),
            Ok(other) => rejected.push(reject(format!("expected a JSON object, got {other}"))),
            Err(e) => rejected.push(reject(e.to_string())),
        }
    }

    (calls, rejected)
}
