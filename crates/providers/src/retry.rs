//! Provider retry: exponential backoff for transient failures.
//!
//! Wraps any provider. Rate limits, timeouts, network errors and 5xx
//! responses are retried; everything else is returned immediately.

use async_trait::async_trait;
use lifechat_core::error::ProviderError;
use lifechat_core::provider::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// A provider that retries its inner provider on transient errors.
pub struct RetryProvider {
    inner: Arc<dyn lifechat_core::Provider>,
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryProvider {
    /// Wrap a provider with the default policy (3 retries, 500ms base, 8s cap).
    pub fn new(inner: Arc<dyn lifechat_core::Provider>) -> Self {
        Self {
            inner,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }

    pub fn from_config(
        inner: Arc<dyn lifechat_core::Provider>,
        config: &lifechat_config::RetryConfig,
    ) -> Self {
        Self::new(inner)
            .with_max_retries(config.max_retries)
            .with_base_delay(Duration::from_millis(config.base_delay_ms))
            .with_max_delay(Duration::from_millis(config.max_delay_ms))
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Wait before retry number `attempt` (0-based).
    ///
    /// `base * 2^attempt`, capped at `max_delay`. A rate-limit hint longer
    /// than that wins.
    fn delay_for(&self, attempt: u32, error: &ProviderError) -> Duration {
        let backoff = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_delay);
        match error {
            ProviderError::RateLimited { retry_after_secs } => {
                backoff.max(Duration::from_secs(*retry_after_secs))
            }
            _ => backoff,
        }
    }
}

#[async_trait]
impl lifechat_core::Provider for RetryProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let mut attempt = 0;
        loop {
            match self.inner.complete(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let wait = self.delay_for(attempt, &e);
                    info!(
                        provider = %self.inner.name(),
                        error = %e,
                        wait_ms = wait.as_millis() as u64,
                        attempt = attempt + 1,
                        max = self.max_retries,
                        "Retrying after transient provider error"
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => {
                    if e.is_transient() {
                        warn!(provider = %self.inner.name(), error = %e, "Provider retries exhausted");
                    }
                    return Err(e);
                }
            }
        }
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        self.inner.health_check().await
    }
}
