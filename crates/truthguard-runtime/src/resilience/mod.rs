//! Resilience patterns for truthguard-runtime.
//!
//! This module provides:
//! - Fixed-interval retry for rate-limited model calls
//! - Usage accounting across pipeline cycles

mod retry;
mod usage;

pub use retry::RetryPolicy;
pub use usage::{CycleReport, LlmUsage, UsageTracker};
