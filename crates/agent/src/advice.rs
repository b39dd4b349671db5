//! Advice and motivational speeches over a journal period.

use chrono::NaiveDateTime;
use lifechat_core::error::GatewayError;
use lifechat_core::message::Transcript;
use lifechat_core::store::RecordStore;
use lifechat_core::Result;
use lifechat_providers::{Completion, LlmGateway};
use std::sync::Arc;
use tracing::debug;

use crate::prompts;

/// Returned without consulting the model when a period has no records.
pub const EMPTY_PERIOD_MESSAGE: &str = "No data for this period. Try to log more events and feelings!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Guidance {
    Advice,
    Motivation,
}

pub struct Advisor {
    gateway: Arc<LlmGateway>,
    store: Arc<dyn RecordStore>,
}

impl Advisor {
    pub fn new(gateway: Arc<LlmGateway>, store: Arc<dyn RecordStore>) -> Self {
        Self { gateway, store }
    }

    /// Up to three short markdown advices for `[start, end)`.
    pub async fn advice(&self, start: NaiveDateTime, end: NaiveDateTime) -> Result<String> {
        self.generate(Guidance::Advice, start, end).await
    }

    /// A short motivational speech for `[start, end)`.
    pub async fn motivational_speech(&self, start: NaiveDateTime, end: NaiveDateTime) -> Result<String> {
        self.generate(Guidance::Motivation, start, end).await
    }

    async fn generate(&self, kind: Guidance, start: NaiveDateTime, end: NaiveDateTime) -> Result<String> {
        let events = self.store.events_between(start, end).await?;
        let feelings = self.store.feelings_between(start, end).await?;
        if events.is_empty() && feelings.is_empty() {
            return Ok(EMPTY_PERIOD_MESSAGE.to_string());
        }
        debug!(?kind, events = events.len(), feelings = feelings.len(), "Generating guidance");

        let transcript = match kind {
            Guidance::Advice => Transcript::new(
                prompts::ADVICE_SYSTEM,
                prompts::advice_request(&events, &feelings),
            ),
            Guidance::Motivation => Transcript::new(
                prompts::MOTIVATION_SYSTEM,
                prompts::motivation_request(&events, &feelings),
            ),
        };

        match self.gateway.complete(&transcript, &[], false).await? {
            Completion::Text(text) => Ok(prompts::unquote(&text).to_string()),
            Completion::ToolCalls(_) => {
                Err(GatewayError::ToolSelection("expected text, got tool calls".into()).into())
            }
        }
    }
}
