//! # truthguard-runtime
//!
//! Async claim-verification pipeline for TruthGuard.
//!
//! This crate does everything that touches the network or the disk:
//! - Pulls candidate claims from untrusted feeds ([`sources`])
//! - Gathers trusted-outlet evidence ([`evidence`])
//! - Asks a language model for a verdict ([`generator`], [`providers`])
//! - Deduplicates and persists records ([`store`])
//! - Sequences all of the above per scope ([`orchestrator`])
//!
//! ## Degradation
//!
//! Outside failures never abort a cycle. Dead feeds fall back to the
//! emergency snapshot, search failures become evidence sentinels, model
//! failures drop the claim, and only store errors reach the caller.
//!
//! ## Example
//!
//! ```rust,ignore
//! use truthguard_core::Scope;
//! use truthguard_runtime::{PipelineOrchestrator, ProviderRegistry, RuntimeConfig};
//!
//! let config = RuntimeConfig::from_yaml_file("truthguard.yaml")?;
//! let registry = ProviderRegistry::with_defaults();
//! let orchestrator = PipelineOrchestrator::from_config(config, &registry).await?;
//!
//! for record in orchestrator.run(Scope::Local).await? {
//!     println!("{} → {}", record.title, record.label);
//! }
//! ```

pub mod cache;
pub mod config;
pub mod evidence;
pub mod generator;
pub mod orchestrator;
pub mod prompts;
pub mod providers;
pub mod resilience;
pub mod sources;
pub mod store;

pub use cache::ResponseCache;
pub use config::{ConfigError, RuntimeConfig};
pub use evidence::{EvidenceRetriever, NewsApiRetriever};
pub use generator::VerdictGenerator;
pub use orchestrator::{
    PipelineOrchestrator, PipelineOrchestratorBuilder, PipelineStats, RuntimeError,
    CHAT_FALLBACK_REPLY,
};
pub use providers::{LlmProvider, ProviderError, ProviderRegistry};
pub use resilience::{CycleReport, LlmUsage, RetryPolicy, UsageTracker};
pub use sources::{Acquisition, FeedFetcher, FeedTarget, SourceAcquirer};
pub use store::{InsertOutcome, RecordStore, SqliteRecordStore, StoreError};
