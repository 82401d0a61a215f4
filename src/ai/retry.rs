//! Retry and timeout boundary around an LLM provider.
//!
//! Every attempt runs under `llm.timeout_secs`. Retryable failures (rate
//! limits, network errors, timeouts, transient server errors, unparseable
//! answers) are retried up to `llm.max_retries` times with exponential
//! backoff; everything else is returned immediately.

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

use super::provider::{LlmProvider, LlmResponse, SharedProvider};
use super::timeout::with_timeout;
use crate::config::LlmConfig;
use crate::constants::network::{BACKOFF_FACTOR, BASE_DELAY_MS, MAX_DELAY_SECS};
use crate::types::{FilerError, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: usize,
    /// Deadline for a single attempt
    pub attempt_timeout: Duration,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&LlmConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            attempt_timeout: Duration::from_secs(config.timeout_secs),
            min_delay: Duration::from_millis(BASE_DELAY_MS),
            max_delay: Duration::from_secs(MAX_DELAY_SECS),
        }
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_factor(BACKOFF_FACTOR)
            .with_max_times(self.max_retries)
            .with_jitter()
    }
}

/// Provider decorator applying [`RetryPolicy`]
pub struct RetryingProvider {
    inner: SharedProvider,
    policy: RetryPolicy,
}

impl RetryingProvider {
    pub fn new(inner: SharedProvider, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    async fn attempt(&self, prompt: &str, schema: &Value) -> Result<LlmResponse> {
        with_timeout(
            self.policy.attempt_timeout,
            self.inner.generate(prompt, schema),
            &format!("{} request", self.inner.name()),
        )
        .await
    }
}

#[async_trait]
impl LlmProvider for RetryingProvider {
    async fn generate(&self, prompt: &str, schema: &Value) -> Result<LlmResponse> {
        (|| self.attempt(prompt, schema))
            .retry(self.policy.backoff())
            .when(FilerError::is_retryable)
            .adjust(|err: &FilerError, delay: Option<Duration>| {
                // Provider-supplied retry-after wins over the computed backoff
                delay.map(|d| err.retry_hint().unwrap_or(d))
            })
            .notify(|err: &FilerError, delay: Duration| {
                warn!(
                    "{} call failed, retrying in {:?}: {}",
                    self.inner.name(),
                    delay,
                    err
                );
            })
            .await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    async fn health_check(&self) -> Result<bool> {
        self.inner.health_check().await
    }
}
