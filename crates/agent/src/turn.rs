//! The tool-orchestration loop: one chat message in, a reply plus records out.
//!
//! A turn runs in two phases:
//! 1. The model must select tools for the user's chat. Calls are executed in
//!    the order returned. Calendar calls and their results are appended to the
//!    transcript; feelings are collected locally and never shown to the model.
//! 2. The system message is rewritten to ask for a conversational reply, the
//!    original request is restated, and the model answers without tools.
//!
//! Nothing is persisted here. Callers store the accumulated records only
//! after a turn completes, so a failed or cancelled turn leaves no trace.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use lifechat_core::error::{GatewayError, ToolError, TurnError};
use lifechat_core::event::{DomainEvent, EventBus};
use lifechat_core::message::{Message, MessageToolCall, Transcript};
use lifechat_core::record::{Event, Feeling};
use lifechat_core::tool::{ToolCall, ToolContext, ToolResult};
use lifechat_providers::{Completion, LlmGateway};
use lifechat_tools::{Adapter, ToolRegistry};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::materialize::calendar_payload_to_event;
use crate::prompts;

/// What a completed turn produced.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The model's conversational reply
    pub reply: String,

    /// Events created on the calendar, in tool-call order
    pub events: Vec<Event>,

    /// Feelings extracted from the chat, in tool-call order
    pub feelings: Vec<Feeling>,

    /// The full message history of the turn
    pub transcript: Transcript,
}

/// Accumulators for the tool-execution phase.
#[derive(Default)]
struct Collected {
    events: Vec<Event>,
    feelings: Vec<Feeling>,
}

/// Drives one chat message through both phases.
pub struct TurnRunner {
    gateway: Arc<LlmGateway>,
    tools: Arc<ToolRegistry>,
    event_bus: Arc<EventBus>,
    account_id: String,
    timezone: Tz,
    tool_timeout: Duration,
    turn_timeout: Duration,
}

impl TurnRunner {
    pub fn new(gateway: Arc<LlmGateway>, tools: Arc<ToolRegistry>, event_bus: Arc<EventBus>) -> Self {
        Self {
            gateway,
            tools,
            event_bus,
            account_id: String::new(),
            timezone: chrono_tz::Europe::Berlin,
            tool_timeout: Duration::from_secs(20),
            turn_timeout: Duration::from_secs(180),
        }
    }

    /// The calendar account adapters act for.
    pub fn with_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = account_id.into();
        self
    }

    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// Deadline for each adapter call.
    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    /// Deadline for the whole turn.
    pub fn with_turn_timeout(mut self, timeout: Duration) -> Self {
        self.turn_timeout = timeout;
        self
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Run a turn stamped with the current time.
    pub async fn run(&self, message: &str) -> Result<TurnOutcome, TurnError> {
        let now = Utc::now().with_timezone(&self.timezone);
        self.run_at(message, now).await
    }

    /// Run a turn with an explicit "now".
    pub async fn run_at(&self, message: &str, now: DateTime<Tz>) -> Result<TurnOutcome, TurnError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(TurnError::EmptyMessage);
        }

        self.event_bus.publish(DomainEvent::TurnStarted {
            message_preview: message.chars().take(80).collect(),
            timestamp: Utc::now(),
        });
        info!(chars = message.len(), at = %prompts::stamp(&now), "Turn started");

        let result = match tokio::time::timeout(self.turn_timeout, self.drive(message, now)).await {
            Ok(result) => result,
            Err(_) => Err(TurnError::DeadlineExceeded {
                secs: self.turn_timeout.as_secs(),
            }),
        };

        match &result {
            Ok(outcome) => {
                info!(
                    events = outcome.events.len(),
                    feelings = outcome.feelings.len(),
                    "Turn completed"
                );
                self.event_bus.publish(DomainEvent::TurnCompleted {
                    events: outcome.events.len(),
                    feelings: outcome.feelings.len(),
                    timestamp: Utc::now(),
                });
            }
            Err(e) => {
                warn!(error = %e, "Turn failed");
                self.event_bus.publish(DomainEvent::TurnFailed {
                    reason: e.to_string(),
                    timestamp: Utc::now(),
                });
            }
        }
        result
    }

    async fn drive(&self, message: &str, now: DateTime<Tz>) -> Result<TurnOutcome, TurnError> {
        let context = ToolContext::new(self.account_id.clone(), now);

        // Phase 1: tool selection
        let mut transcript = Transcript::new(prompts::extraction_system(&now), message);
        let calls = match self
            .gateway
            .complete(&transcript, &self.tools.definitions(), true)
            .await?
        {
            Completion::ToolCalls(calls) => calls,
            Completion::Text(_) => {
                return Err(GatewayError::ToolSelection(
                    "expected tool calls, got text".into(),
                )
                .into());
            }
        };
        debug!(calls = calls.len(), "Executing tool calls");

        let mut collected = Collected::default();
        for call in calls {
            self.execute(call, &context, &mut transcript, &mut collected)
                .await;
        }

        // Phase 2: conversational reply
        transcript.replace_system(prompts::reply_system(
            &now,
            collected.events.len(),
            collected.feelings.len(),
        ));
        transcript.replace_first_user(prompts::restate_request(message));

        let reply = match self.gateway.complete(&transcript, &[], false).await? {
            Completion::Text(text) => prompts::unquote(&text).to_string(),
            Completion::ToolCalls(calls) => {
                return Err(GatewayError::ToolSelection(format!(
                    "model requested {} tool call(s) instead of a final reply",
                    calls.len()
                ))
                .into());
            }
        };
        transcript.push(Message::assistant(reply.clone()));

        Ok(TurnOutcome {
            reply,
            events: collected.events,
            feelings: collected.feelings,
            transcript,
        })
    }

    async fn execute(
        &self,
        call: ToolCall,
        context: &ToolContext,
        transcript: &mut Transcript,
        collected: &mut Collected,
    ) {
        let Some(adapter) = self.tools.get(&call.name) else {
            warn!(tool = %call.name, call_id = %call.id, "Model requested an unknown tool, skipping");
            return;
        };

        let started = Instant::now();

        if let Adapter::FeelingExtract(tool) = adapter {
            let result = tool.extract(&call.arguments, context);
            self.tool_executed(&call.name, result.is_ok(), started);
            match result {
                Ok(feeling) => collected.feelings.push(feeling),
                Err(e) => warn!(call_id = %call.id, error = %e, "Feeling extraction rejected"),
            }
            return;
        }

        let result = match tokio::time::timeout(
            self.tool_timeout,
            adapter.tool().execute(call.arguments.clone(), context),
        )
        .await
        {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => ToolResult::failed(e.to_string()),
            Err(_) => ToolResult::failed(
                ToolError::Timeout {
                    tool_name: call.name.clone(),
                    timeout_secs: self.tool_timeout.as_secs(),
                }
                .to_string(),
            ),
        };
        if let Some(error) = &result.error {
            warn!(tool = %call.name, call_id = %call.id, error = %error, "Adapter call failed");
        }
        self.tool_executed(&call.name, result.success, started);

        transcript.push(Message::assistant_tool_call(MessageToolCall {
            id: call.id.clone(),
            name: call.name.clone(),
            arguments: call.arguments.to_string(),
        }));
        transcript.push(Message::tool_result(
            call.id.clone(),
            result.to_transcript_content(),
        ));

        if matches!(adapter, Adapter::CalendarInsert(_)) && result.success {
            match result.data.as_ref().map(calendar_payload_to_event) {
                Some(Ok(event)) => collected.events.push(event),
                Some(Err(e)) => warn!(call_id = %call.id, error = %e, "Cannot materialize calendar event"),
                None => warn!(call_id = %call.id, "Calendar insert succeeded without a payload"),
            }
        }
    }

    fn tool_executed(&self, tool_name: &str, success: bool, started: Instant) {
        let duration_ms = started.elapsed().as_millis() as u64;
        debug!(tool = %tool_name, success, duration_ms, "Tool executed");
        self.event_bus.publish(DomainEvent::ToolExecuted {
            tool_name: tool_name.to_string(),
            success,
            duration_ms,
            timestamp: Utc::now(),
        });
    }
}
