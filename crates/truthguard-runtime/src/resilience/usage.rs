//! Usage accounting for model calls and pipeline cycles.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use truthguard_core::Scope;

use crate::providers::TokenUsage;

/// Number of cycle reports kept for `/api/stats`.
const RECENT_CYCLES: usize = 20;

/// Accumulated model usage since process start.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmUsage {
    /// Successful completion calls
    pub llm_calls: u32,

    /// Prompt/input tokens
    pub prompt_tokens: u32,

    /// Completion/output tokens
    pub completion_tokens: u32,

    /// Responses rejected with a rate limit
    pub rate_limited: u32,

    /// Calls that produced no usable verdict
    pub failures: u32,
}

impl LlmUsage {
    pub fn total_tokens(&self) -> u32 {
        self.prompt_tokens.saturating_add(self.completion_tokens)
    }
}

/// Summary of one pipeline cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    pub scope: Scope,
    pub started_at: DateTime<Utc>,

    /// Served from the response cache
    pub cached: bool,

    /// Served straight from the store without acquisition
    pub fast_path: bool,

    /// Label of the feed (or emergency snapshot) the claims came from
    pub source_used: Option<String>,

    pub acquired: usize,
    pub new_claims: usize,
    pub persisted: usize,

    /// Lost a race to an identical title
    pub skipped: usize,

    /// No verdict, store error or timeout
    pub failed: usize,
    pub duration_ms: u64,
}

impl CycleReport {
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            started_at: Utc::now(),
            cached: false,
            fast_path: false,
            source_used: None,
            acquired: 0,
            new_claims: 0,
            persisted: 0,
            skipped: 0,
            failed: 0,
            duration_ms: 0,
        }
    }
}

/// Thread-safe tracker shared by the generator and the orchestrator.
#[derive(Debug, Default)]
pub struct UsageTracker {
    usage: RwLock<LlmUsage>,
    cycles: RwLock<VecDeque<CycleReport>>,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful completion.
    pub fn record_call(&self, usage: &TokenUsage) {
        let mut current = self.usage.write();
        current.llm_calls = current.llm_calls.saturating_add(1);
        current.prompt_tokens = current.prompt_tokens.saturating_add(usage.prompt_tokens);
        current.completion_tokens = current.completion_tokens.saturating_add(usage.completion_tokens);
    }

    pub fn record_rate_limited(&self) {
        let mut current = self.usage.write();
        current.rate_limited = current.rate_limited.saturating_add(1);
    }

    pub fn record_failure(&self) {
        let mut current = self.usage.write();
        current.failures = current.failures.saturating_add(1);
    }

    pub fn record_cycle(&self, report: CycleReport) {
        let mut cycles = self.cycles.write();
        if cycles.len() == RECENT_CYCLES {
            cycles.pop_front();
        }
        cycles.push_back(report);
    }

    /// Snapshot of accumulated usage.
    pub fn usage(&self) -> LlmUsage {
        self.usage.read().clone()
    }

    /// Most recent cycles, newest last.
    pub fn recent_cycles(&self) -> Vec<CycleReport> {
        self.cycles.read().iter().cloned().collect()
    }
}
