//! Verdict Generator.
//!
//! Wraps an [`LlmProvider`] in JSON mode. Rate-limit responses are retried
//! on a fixed schedule; every other failure, and any output that does not
//! parse as a JSON object, yields `None` without retrying.

use serde_json::Value;
use std::sync::Arc;
use truthguard_core::Verdict;

use crate::providers::{ChatMessage, CompletionConfig, LlmProvider};
use crate::resilience::{RetryPolicy, UsageTracker};

/// Produces validated verdicts from chat messages.
pub struct VerdictGenerator {
    provider: Arc<dyn LlmProvider>,
    completion: CompletionConfig,
    retry: RetryPolicy,
    usage: Arc<UsageTracker>,
}

impl VerdictGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>, completion: CompletionConfig) -> Self {
        Self {
            provider,
            completion: CompletionConfig {
                json_mode: true,
                ..completion
            },
            retry: RetryPolicy::default(),
            usage: Arc::new(UsageTracker::new()),
        }
    }

    /// Set the rate-limit retry schedule.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Share a usage tracker with other components.
    pub fn with_usage(mut self, usage: Arc<UsageTracker>) -> Self {
        self.usage = usage;
        self
    }

    pub fn usage(&self) -> &Arc<UsageTracker> {
        &self.usage
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Whether the provider reports itself usable (e.g. has a credential).
    pub async fn provider_ready(&self) -> bool {
        self.provider.health_check().await
    }

    /// Generate a verdict using the configured retry budget.
    pub async fn generate(&self, messages: Vec<ChatMessage>) -> Option<Verdict> {
        self.generate_with_retries(messages, self.retry.max_retries)
            .await
    }

    /// Generate a verdict allowing `max_retries` retries after rate limits.
    pub async fn generate_with_retries(
        &self,
        messages: Vec<ChatMessage>,
        max_retries: usize,
    ) -> Option<Verdict> {
        let value = self
            .complete_with_policy(messages, self.retry.with_max_retries(max_retries))
            .await?;

        match Verdict::from_value(value) {
            Ok(verdict) => Some(verdict),
            Err(e) => {
                tracing::warn!(error = %e, "Model output rejected as verdict");
                self.usage.record_failure();
                None
            }
        }
    }

    /// Request a raw JSON object with the configured retry budget.
    pub async fn complete_json(&self, messages: Vec<ChatMessage>) -> Option<Value> {
        self.complete_with_policy(messages, self.retry).await
    }

    async fn complete_with_policy(
        &self,
        messages: Vec<ChatMessage>,
        policy: RetryPolicy,
    ) -> Option<Value> {
        let mut delays = policy.delays();
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            match self.provider.complete(messages.clone(), &self.completion).await {
                Ok(response) => {
                    self.usage.record_call(&response.usage);
                    tracing::debug!(attempt, tokens = response.usage.total(), "Completion received");

                    return match serde_json::from_str::<Value>(&response.content) {
                        Ok(value) if value.is_object() => Some(value),
                        Ok(_) => {
                            tracing::warn!(attempt, "Model returned JSON that is not an object");
                            self.usage.record_failure();
                            None
                        }
                        Err(e) => {
                            tracing::warn!(attempt, error = %e, "Model returned unparsable JSON");
                            self.usage.record_failure();
                            None
                        }
                    };
                }
                Err(e) if e.is_rate_limited() => {
                    self.usage.record_rate_limited();

                    match delays.next() {
                        Some(delay) => {
                            tracing::warn!(attempt, delay = ?delay, "Rate limited, retrying");
                            tokio::time::sleep(delay).await;
                        }
                        None => {
                            tracing::warn!(attempt, "Rate limited, retries exhausted");
                            self.usage.record_failure();
                            return None;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, provider = self.provider.name(), "Completion failed");
                    self.usage.record_failure();
                    return None;
                }
            }
        }
    }
}
