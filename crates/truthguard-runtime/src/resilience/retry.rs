//! Fixed-interval retry policy.
//!
//! Only rate-limit responses are retried. The wait between attempts is
//! constant and does not honour any `retry-after` hint from the provider.

use backon::{BackoffBuilder, ConstantBuilder};
use std::time::Duration;

/// How many times a rate-limited call is retried and how long to wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: usize,

    /// Wait between attempts
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: Duration::from_secs(3),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: usize, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// Same interval, different retry budget.
    pub fn with_max_retries(self, max_retries: usize) -> Self {
        Self {
            max_retries,
            ..self
        }
    }

    /// Delays to sleep before each retry, in order.
    ///
    /// Yields exactly `max_retries` items.
    pub fn delays(&self) -> impl Iterator<Item = Duration> {
        ConstantBuilder::default()
            .with_delay(self.backoff)
            .with_max_times(self.max_retries)
            .build()
    }
}
