//! Pipeline orchestrator.
//!
//! One cycle per scope request:
//! - Response cache, then the fast path when the store is already populated
//! - Cold path: acquire → dedup gate → (evidence → verdict → persist) per claim
//! - Bounded batches via `join_all` with a mandatory pause between batches
//! - Failures and timeouts are contained to the claim that caused them

use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use truthguard_core::{Claim, Scope, VerifiedRecord};

use crate::cache::ResponseCache;
use crate::config::{ConfigError, PipelineSettings, RuntimeConfig, SourceSettings};
use crate::evidence::{EvidenceRetriever, NewsApiRetriever};
use crate::generator::VerdictGenerator;
use crate::prompts;
use crate::providers::{LlmProvider, ProviderRegistry};
use crate::resilience::{CycleReport, LlmUsage, UsageTracker};
use crate::sources::{EmergencySnapshot, FeedFetcher, HttpFeedFetcher, SourceAcquirer};
use crate::store::{InsertOutcome, RecordStore, SqliteRecordStore, StoreError};

/// Reply used when the chat model gives nothing usable.
pub const CHAT_FALLBACK_REPLY: &str = "System busy.";

/// Errors from the runtime orchestrator.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// What happened to one claim on the cold path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClaimOutcome {
    Persisted,
    Duplicate,
    Failed,
}

/// Usage and recent cycles, as served by `/api/stats`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStats {
    pub provider: String,
    pub provider_ready: bool,
    pub usage: LlmUsage,
    pub recent_cycles: Vec<CycleReport>,
}

/// The pipeline orchestrator owns every piece of process-scoped state.
///
/// # Architecture
/// - Store: append-only, title-unique; arbitrates concurrent duplicates
/// - Cache: last response per scope, bounded by TTL
/// - Usage: shared with the generator for `/api/stats`
pub struct PipelineOrchestrator {
    acquirer: SourceAcquirer,
    retriever: Arc<dyn EvidenceRetriever>,
    generator: VerdictGenerator,
    store: Arc<dyn RecordStore>,
    cache: ResponseCache,
    usage: Arc<UsageTracker>,
    sources: SourceSettings,
    pipeline: PipelineSettings,
}

impl PipelineOrchestrator {
    /// Start building an orchestrator from configuration.
    pub fn builder(config: RuntimeConfig) -> PipelineOrchestratorBuilder {
        PipelineOrchestratorBuilder::new(config)
    }

    /// Compose the production pipeline: SQLite store, registry provider,
    /// NewsAPI evidence and live feeds.
    pub async fn from_config(
        config: RuntimeConfig,
        registry: &ProviderRegistry,
    ) -> Result<Self, RuntimeError> {
        let provider = registry
            .create(&config.llm.provider, &config.llm.provider_config())
            .map_err(|e| RuntimeError::ProviderNotConfigured(e.to_string()))?;
        let store = SqliteRecordStore::connect(&config.database_url).await?;

        PipelineOrchestratorBuilder::new(config)
            .provider(provider)
            .store(Arc::new(store))
            .build()
    }

    /// Serve the record list for a scope.
    pub async fn run(&self, scope: Scope) -> Result<Vec<VerifiedRecord>, RuntimeError> {
        let started = Instant::now();
        let mut report = CycleReport::new(scope);

        if let Some(cached) = self.cache.get(scope).await {
            report.cached = true;
            self.finish(report, started);
            return Ok(cached.as_ref().clone());
        }

        let stored = self.store.count(scope).await?;
        if stored > self.pipeline.freshness_threshold {
            tracing::debug!(%scope, stored, "Serving from store");
            report.fast_path = true;
            let records = self.store.recent(scope, self.pipeline.page_size).await?;
            self.cache.insert(scope, Arc::new(records.clone())).await;
            self.finish(report, started);
            return Ok(records);
        }

        let acquisition = self
            .acquirer
            .acquire(scope, self.sources.targets(scope))
            .await;
        report.source_used = Some(acquisition.source_used.clone());
        report.acquired = acquisition.claims.len();

        let fresh = self.store.filter_new(acquisition.claims).await?;
        report.new_claims = fresh.len();

        if fresh.is_empty() {
            tracing::info!(%scope, source = %acquisition.source_used, "No new claims to verify");
        } else {
            self.verify_all(scope, &fresh, &mut report).await;
        }

        let records = self.store.recent(scope, self.pipeline.page_size).await?;
        self.cache.insert(scope, Arc::new(records.clone())).await;
        self.finish(report, started);
        Ok(records)
    }

    /// Answer a free-form question with no evidence step.
    pub async fn chat(&self, message: &str) -> String {
        let reply = self
            .generator
            .complete_json(prompts::chat_messages(message))
            .await
            .and_then(|value| {
                ["explanation", "reply"]
                    .into_iter()
                    .find_map(|key| value.get(key).and_then(|v| v.as_str()).map(str::trim))
                    .filter(|text| !text.is_empty())
                    .map(str::to_string)
            });

        reply.unwrap_or_else(|| CHAT_FALLBACK_REPLY.to_string())
    }

    /// Provider readiness, usage counters and recent cycle reports.
    pub async fn stats(&self) -> PipelineStats {
        PipelineStats {
            provider: self.generator.provider_name().to_string(),
            provider_ready: self.generator.provider_ready().await,
            usage: self.usage.usage(),
            recent_cycles: self.usage.recent_cycles(),
        }
    }

    async fn verify_all(&self, scope: Scope, claims: &[Claim], report: &mut CycleReport) {
        for (index, batch) in claims.chunks(self.pipeline.batch_size.max(1)).enumerate() {
            if index > 0 && !self.pipeline.batch_pause.is_zero() {
                tokio::time::sleep(self.pipeline.batch_pause).await;
            }

            let outcomes = join_all(batch.iter().map(|claim| self.verify_bounded(scope, claim))).await;

            for outcome in outcomes {
                match outcome {
                    ClaimOutcome::Persisted => report.persisted += 1,
                    ClaimOutcome::Duplicate => report.skipped += 1,
                    ClaimOutcome::Failed => report.failed += 1,
                }
            }
        }
    }

    async fn verify_bounded(&self, scope: Scope, claim: &Claim) -> ClaimOutcome {
        let timeout = self.pipeline.claim_timeout;

        match tokio::time::timeout(timeout, self.verify_claim(scope, claim)).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                tracing::warn!(%scope, title = %claim.preview(), error = %e, "Claim dropped");
                ClaimOutcome::Failed
            }
            Err(_) => {
                tracing::warn!(%scope, title = %claim.preview(), timeout = ?timeout, "Claim timed out");
                ClaimOutcome::Failed
            }
        }
    }

    async fn verify_claim(&self, scope: Scope, claim: &Claim) -> Result<ClaimOutcome, StoreError> {
        tracing::info!(%scope, title = %claim.preview(), "Analyzing claim");

        let evidence = self.retriever.retrieve(&claim.title, scope).await;
        let messages = prompts::verdict_messages(claim, &evidence, scope);

        let Some(verdict) = self.generator.generate(messages).await else {
            tracing::warn!(%scope, title = %claim.preview(), "No verdict produced");
            return Ok(ClaimOutcome::Failed);
        };

        let record =
            VerifiedRecord::assemble(claim.clone(), verdict, scope, &evidence, chrono::Utc::now());

        Ok(match self.store.insert(&record).await? {
            InsertOutcome::Inserted => ClaimOutcome::Persisted,
            InsertOutcome::Duplicate => ClaimOutcome::Duplicate,
        })
    }

    fn finish(&self, mut report: CycleReport, started: Instant) {
        report.duration_ms = started.elapsed().as_millis() as u64;

        tracing::info!(
            scope = %report.scope,
            cached = report.cached,
            fast_path = report.fast_path,
            source = report.source_used.as_deref().unwrap_or("-"),
            acquired = report.acquired,
            new = report.new_claims,
            persisted = report.persisted,
            skipped = report.skipped,
            failed = report.failed,
            duration_ms = report.duration_ms,
            "Cycle complete"
        );

        self.usage.record_cycle(report);
    }
}

/// Builder for PipelineOrchestrator.
pub struct PipelineOrchestratorBuilder {
    config: RuntimeConfig,
    provider: Option<Arc<dyn LlmProvider>>,
    retriever: Option<Arc<dyn EvidenceRetriever>>,
    fetcher: Option<Arc<dyn FeedFetcher>>,
    store: Option<Arc<dyn RecordStore>>,
}

impl PipelineOrchestratorBuilder {
    /// Create a new builder.
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            config,
            provider: None,
            retriever: None,
            fetcher: None,
            store: None,
        }
    }

    /// Set the LLM provider.
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the evidence retriever; defaults to NewsAPI with the env key.
    pub fn retriever(mut self, retriever: Arc<dyn EvidenceRetriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    /// Set the feed fetcher; defaults to live HTTP feeds.
    pub fn fetcher(mut self, fetcher: Arc<dyn FeedFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Set the record store.
    pub fn store(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Build the orchestrator.
    pub fn build(self) -> Result<PipelineOrchestrator, RuntimeError> {
        let config = self.config;
        config.validate()?;

        let provider = self
            .provider
            .ok_or_else(|| RuntimeError::ProviderNotConfigured("No LLM provider set".to_string()))?;
        let store = self
            .store
            .ok_or_else(|| ConfigError::Invalid("No record store set".to_string()))?;

        let fetcher: Arc<dyn FeedFetcher> = match self.fetcher {
            Some(fetcher) => fetcher,
            None => Arc::new(
                HttpFeedFetcher::new(&config.sources)
                    .map_err(|e| ConfigError::Invalid(e.to_string()))?,
            ),
        };
        let retriever = self
            .retriever
            .unwrap_or_else(|| Arc::new(NewsApiRetriever::from_env(config.search.clone())));

        let emergency = EmergencySnapshot::from_settings(&config.emergency)?;
        let usage = Arc::new(UsageTracker::new());
        let generator = VerdictGenerator::new(provider, config.llm.completion_config())
            .with_retry(config.retry.policy())
            .with_usage(usage.clone());

        Ok(PipelineOrchestrator {
            acquirer: SourceAcquirer::new(fetcher, emergency, config.sources.min_title_len),
            retriever,
            generator,
            store,
            cache: ResponseCache::new(config.pipeline.cache_ttl),
            usage,
            sources: config.sources,
            pipeline: config.pipeline,
        })
    }
}
