//! Runtime configuration.
//!
//! Every field has a default so an empty YAML document is a valid
//! configuration. Durations are written as humantime strings
//! (`"1200ms"`, `"3s"`, `"5m"`).

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use truthguard_core::{Claim, Scope, DEFAULT_QUERY_WORDS};

use crate::providers::CompletionConfig;
use crate::resilience::RetryPolicy;
use crate::sources::FeedTarget;

/// Browser identity sent to feed hosts that block non-browser clients.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36";

/// Errors from loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Connection string for the record store
    pub database_url: String,

    /// Language model settings
    pub llm: LlmSettings,

    /// Rate-limit retry schedule for the model
    pub retry: RetrySettings,

    /// Trusted-domain search settings
    pub search: SearchSettings,

    /// Untrusted feed settings
    pub sources: SourceSettings,

    /// Orchestration settings
    pub pipeline: PipelineSettings,

    /// Claims served when every live feed fails
    pub emergency: EmergencySettings,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:truthguard.db?mode=rwc".to_string(),
            llm: LlmSettings::default(),
            retry: RetrySettings::default(),
            search: SearchSettings::default(),
            sources: SourceSettings::default(),
            pipeline: PipelineSettings::default(),
            emergency: EmergencySettings::default(),
        }
    }
}

impl RuntimeConfig {
    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: RuntimeConfig = if yaml.trim().is_empty() {
            RuntimeConfig::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::Invalid("database_url is empty".to_string()));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::Invalid(format!(
                "llm.temperature must be within 0.0..=2.0, got {}",
                self.llm.temperature
            )));
        }

        if let Some(url) = &self.llm.base_url {
            check_http_url("llm.base_url", url)?;
        }
        check_http_url("search.base_url", &self.search.base_url)?;
        check_http_url("sources.reddit_base_url", &self.sources.reddit_base_url)?;

        if self.search.page_size == 0 {
            return Err(ConfigError::Invalid("search.page_size must be at least 1".to_string()));
        }

        if self.search.query_words == 0 {
            return Err(ConfigError::Invalid("search.query_words must be at least 1".to_string()));
        }

        if self.pipeline.batch_size == 0 {
            return Err(ConfigError::Invalid("pipeline.batch_size must be at least 1".to_string()));
        }

        if self.pipeline.page_size == 0 {
            return Err(ConfigError::Invalid("pipeline.page_size must be at least 1".to_string()));
        }

        for target in self.sources.local.iter().chain(self.sources.global.iter()) {
            if let FeedTarget::Rss { url } = target {
                check_http_url("sources rss target", url)?;
            }
        }

        let budget = self.claim_budget();
        if self.pipeline.claim_timeout < budget {
            tracing::warn!(
                claim_timeout = ?self.pipeline.claim_timeout,
                budget = ?budget,
                "pipeline.claim_timeout is shorter than search + model retries; slow claims will be dropped"
            );
        }

        Ok(())
    }

    /// Worst case for one claim: the search timeout, every model attempt
    /// timing out, and the backoff between attempts.
    pub fn claim_budget(&self) -> Duration {
        let attempts = u32::try_from(self.retry.max_retries.saturating_add(1)).unwrap_or(u32::MAX);
        let backoffs = attempts - 1;

        self.search
            .timeout
            .saturating_add(self.llm.timeout.saturating_mul(attempts))
            .saturating_add(self.retry.backoff.saturating_mul(backoffs))
    }
}

fn check_http_url(field: &str, url: &str) -> Result<(), ConfigError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{} must start with http:// or https://, got '{}'",
            field, url
        )))
    }
}

/// Language model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Provider type registered in the provider registry
    pub provider: String,

    /// Model name
    pub model: String,

    /// API endpoint override
    pub base_url: Option<String>,

    /// Sampling temperature; kept low for repeatable verdicts
    pub temperature: f32,

    /// Maximum tokens per completion
    pub max_tokens: u32,

    /// Request timeout
    #[serde(with = "duration_str")]
    pub timeout: Duration,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "groq".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            base_url: None,
            temperature: 0.1,
            max_tokens: 512,
            timeout: Duration::from_secs(30),
        }
    }
}

impl LlmSettings {
    pub fn completion_config(&self) -> CompletionConfig {
        CompletionConfig {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            timeout: self.timeout,
            json_mode: true,
        }
    }

    /// JSON form handed to the provider registry.
    pub fn provider_config(&self) -> serde_json::Value {
        let mut config = serde_json::json!({ "model": self.model });
        if let Some(url) = &self.base_url {
            config["base_url"] = serde_json::Value::String(url.clone());
        }
        config
    }
}

/// Retry schedule for rate-limited model calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Retries after the first attempt
    pub max_retries: usize,

    /// Fixed pause before each retry
    #[serde(with = "duration_str")]
    pub backoff: Duration,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: Duration::from_secs(3),
        }
    }
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.backoff)
    }
}

/// Trusted-domain search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// NewsAPI-compatible base URL
    pub base_url: String,

    /// Articles requested per claim
    pub page_size: u32,

    /// Words of the claim kept in the query
    pub query_words: usize,

    /// Request timeout
    #[serde(with = "duration_str")]
    pub timeout: Duration,

    /// Outlets searched for local claims
    pub local_domains: Vec<String>,

    /// Outlets searched for global claims
    pub global_domains: Vec<String>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            base_url: "https://newsapi.org/v2".to_string(),
            page_size: 2,
            query_words: DEFAULT_QUERY_WORDS,
            timeout: Duration::from_secs(5),
            local_domains: to_strings(&[
                "ekantipur.com",
                "kathmandupost.com",
                "thehimalayantimes.com",
                "setopati.com",
                "onlinekhabar.com",
                "ratopati.com",
                "nayapatrikadaily.com",
                "annapurnapost.com",
                "reuters.com",
            ]),
            global_domains: to_strings(&[
                "reuters.com",
                "apnews.com",
                "bbc.co.uk",
                "aljazeera.com",
                "theguardian.com",
                "npr.org",
            ]),
        }
    }
}

impl SearchSettings {
    /// Allow-list for a scope.
    pub fn domains(&self, scope: Scope) -> &[String] {
        match scope {
            Scope::Local => &self.local_domains,
            Scope::Global => &self.global_domains,
        }
    }
}

/// Untrusted feed settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Base URL for subreddit listings
    pub reddit_base_url: String,

    /// Client identity sent with every feed request
    pub user_agent: String,

    /// Per-feed request timeout
    #[serde(with = "duration_str")]
    pub timeout: Duration,

    /// Posts requested per listing
    pub listing_limit: u32,

    /// Titles at or below this many characters are dropped
    pub min_title_len: usize,

    /// Local feeds in priority order
    pub local: Vec<FeedTarget>,

    /// Global feeds in priority order
    pub global: Vec<FeedTarget>,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            reddit_base_url: "https://www.reddit.com".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(5),
            listing_limit: 10,
            min_title_len: 10,
            local: vec![
                FeedTarget::subreddit("newsnepal289"),
                FeedTarget::subreddit("nepalnews"),
                FeedTarget::subreddit("nepalsocial"),
            ],
            global: vec![
                FeedTarget::subreddit("worldnews"),
                FeedTarget::subreddit("news"),
                FeedTarget::rss("https://www.reddit.com/r/worldnews/new/.rss"),
            ],
        }
    }
}

impl SourceSettings {
    /// Feed targets for a scope, in priority order.
    pub fn targets(&self, scope: Scope) -> &[FeedTarget] {
        match scope {
            Scope::Local => &self.local,
            Scope::Global => &self.global,
        }
    }
}

/// Orchestration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Stored records above which a request skips the cold path
    pub freshness_threshold: u64,

    /// Records returned per response
    pub page_size: u32,

    /// Claims verified concurrently
    pub batch_size: usize,

    /// Pause between batches; keeps the model under its rate ceiling
    #[serde(with = "duration_str")]
    pub batch_pause: Duration,

    /// Upper bound on one claim's retrieval + verdict + persist
    #[serde(with = "duration_str")]
    pub claim_timeout: Duration,

    /// Response cache lifetime; zero disables the cache
    #[serde(with = "duration_str")]
    pub cache_ttl: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            freshness_threshold: 5,
            page_size: 20,
            batch_size: 1,
            batch_pause: Duration::from_millis(1200),
            claim_timeout: Duration::from_secs(150),
            cache_ttl: Duration::from_secs(300),
        }
    }
}

/// Claims that replace the built-in emergency snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmergencySettings {
    pub local: Vec<Claim>,
    pub global: Vec<Claim>,
}

impl EmergencySettings {
    pub fn claims(&self, scope: Scope) -> &[Claim] {
        match scope {
            Scope::Local => &self.local,
            Scope::Global => &self.global,
        }
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

/// Serde adapter for humantime duration strings.
mod duration_str {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_is_default() {
        let config = RuntimeConfig::from_yaml("").unwrap();
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.pipeline.freshness_threshold, 5);
        assert_eq!(config.pipeline.page_size, 20);
        assert_eq!(config.search.page_size, 2);
        assert_eq!(config.sources.local.len(), 3);
        assert_eq!(config.llm.temperature, 0.1);
    }

    #[test]
    fn test_partial_yaml_with_durations() {
        let yaml = r#"
database_url: "sqlite::memory:"
retry:
  max_retries: 5
  backoff: "1s 500ms"
pipeline:
  batch_size: 3
  batch_pause: "2s"
sources:
  local:
    - kind: subreddit
      name: kathmandu
    - kind: rss
      url: "https://example.com/feed.xml"
emergency:
  local:
    - title: "Configured emergency claim one"
      url: "https://example.com/1"
"#;
        let config = RuntimeConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.backoff, Duration::from_millis(1500));
        assert_eq!(config.pipeline.batch_size, 3);
        assert_eq!(config.pipeline.batch_pause, Duration::from_secs(2));
        assert_eq!(config.pipeline.page_size, 20);
        assert_eq!(
            config.sources.targets(Scope::Local),
            &[FeedTarget::subreddit("kathmandu"), FeedTarget::rss("https://example.com/feed.xml")]
        );
        assert_eq!(config.emergency.claims(Scope::Local).len(), 1);
        assert!(config.emergency.claims(Scope::Global).is_empty());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(RuntimeConfig::from_yaml("pipeline:\n  batch_size: 0\n").is_err());
        assert!(RuntimeConfig::from_yaml("llm:\n  temperature: 3.5\n").is_err());
        assert!(RuntimeConfig::from_yaml("search:\n  base_url: newsapi.org\n").is_err());
        assert!(RuntimeConfig::from_yaml("retry:\n  backoff: soon\n").is_err());
    }

    #[test]
    fn test_default_claim_timeout_covers_inner_bounds() {
        let config = RuntimeConfig::default();
        assert_eq!(config.claim_budget(), Duration::from_secs(5 + 4 * 30 + 3 * 3));
        assert!(config.pipeline.claim_timeout >= config.claim_budget());
    }

    #[test]
    fn test_claim_budget_follows_retry_settings() {
        let yaml = "retry:\n  max_retries: 0\n  backoff: \"2s\"\nllm:\n  timeout: \"10s\"\n";
        let config = RuntimeConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.claim_budget(), Duration::from_secs(15));
    }

    #[test]
    fn test_domains_per_scope() {
        let search = SearchSettings::default();
        assert!(search.domains(Scope::Local).contains(&"kathmandupost.com".to_string()));
        assert!(search.domains(Scope::Global).contains(&"apnews.com".to_string()));
    }

    #[test]
    fn test_completion_config_requests_json() {
        let config = LlmSettings::default().completion_config();
        assert!(config.json_mode);
        assert_eq!(config.model, "llama-3.3-70b-versatile");
    }

    #[test]
    fn test_round_trip_serialization() {
        let yaml = serde_yaml::to_string(&RuntimeConfig::default()).unwrap();
        let config = RuntimeConfig::from_yaml(&yaml).unwrap();
        assert_eq!(config.pipeline.batch_pause, Duration::from_millis(1200));
    }
}
