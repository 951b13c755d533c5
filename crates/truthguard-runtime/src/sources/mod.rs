//! Source Acquirer.
//!
//! Pulls candidate claims from untrusted feeds. Targets are tried in
//! priority order and the first one yielding an eligible item wins. When
//! every target fails the acquirer falls back to the emergency snapshot, so
//! acquisition itself never fails.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use truthguard_core::{is_eligible_title, Claim, Scope, EMERGENCY_SOURCE_LABEL};

mod emergency;
mod http;
mod reddit;
mod rss;

pub use emergency::EmergencySnapshot;
pub use http::HttpFeedFetcher;

/// An untrusted feed to pull claims from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedTarget {
    /// Reddit listing JSON for a subreddit
    Subreddit { name: String },

    /// RSS 2.0 or Atom document
    Rss { url: String },
}

impl FeedTarget {
    pub fn subreddit(name: impl Into<String>) -> Self {
        FeedTarget::Subreddit { name: name.into() }
    }

    pub fn rss(url: impl Into<String>) -> Self {
        FeedTarget::Rss { url: url.into() }
    }

    /// Label stamped on claims from this target.
    pub fn label(&self) -> String {
        match self {
            FeedTarget::Subreddit { name } => format!("r/{}", name),
            FeedTarget::Rss { url } => url.clone(),
        }
    }
}

impl fmt::Display for FeedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// A raw entry from a feed, before eligibility filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub url: String,

    /// Moderator-pinned (stickied) post
    pub pinned: bool,
}

impl FeedItem {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            pinned: false,
        }
    }

    pub fn pinned(mut self) -> Self {
        self.pinned = true;
        self
    }
}

/// Errors from fetching a single feed.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Feed request failed: {0}")]
    Http(String),

    #[error("Feed host refused the request with status {0}")]
    Blocked(u16),

    #[error("Feed body could not be parsed: {0}")]
    Parse(String),

    #[error("Feed had no eligible items")]
    Empty,
}

/// Fetches raw items from one feed target.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, target: &FeedTarget) -> Result<Vec<FeedItem>, SourceError>;
}

/// Claims from one acquisition cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Acquisition {
    pub claims: Vec<Claim>,

    /// Label of the target that produced the claims
    pub source_used: String,
}

impl Acquisition {
    /// Whether the claims came from the emergency snapshot.
    pub fn is_emergency(&self) -> bool {
        self.source_used == EMERGENCY_SOURCE_LABEL
    }
}

/// Walks feed targets in priority order.
pub struct SourceAcquirer {
    fetcher: Arc<dyn FeedFetcher>,
    emergency: EmergencySnapshot,
    min_title_len: usize,
}

impl SourceAcquirer {
    pub fn new(
        fetcher: Arc<dyn FeedFetcher>,
        emergency: EmergencySnapshot,
        min_title_len: usize,
    ) -> Self {
        Self {
            fetcher,
            emergency,
            min_title_len,
        }
    }

    /// Acquire claims for a scope from the first target with eligible items.
    pub async fn acquire(&self, scope: Scope, targets: &[FeedTarget]) -> Acquisition {
        for target in targets {
            match self.try_target(target).await {
                Ok(claims) => {
                    tracing::info!(%scope, source = %target, claims = claims.len(), "Acquired claims");
                    return Acquisition {
                        claims,
                        source_used: target.label(),
                    };
                }
                Err(e) => {
                    tracing::warn!(%scope, source = %target, error = %e, "Feed unavailable, trying next");
                }
            }
        }

        tracing::warn!(%scope, "All feeds failed, using emergency snapshot");
        Acquisition {
            claims: self.emergency.claims(scope),
            source_used: EMERGENCY_SOURCE_LABEL.to_string(),
        }
    }

    async fn try_target(&self, target: &FeedTarget) -> Result<Vec<Claim>, SourceError> {
        let items = self.fetcher.fetch(target).await?;
        let label = target.label();

        let claims: Vec<Claim> = items
            .into_iter()
            .filter(|item| is_eligible_title(&item.title, item.pinned, self.min_title_len))
            .map(|item| Claim::new(item.title.trim(), item.url, label.clone()))
            .collect();

        if claims.is_empty() {
            return Err(SourceError::Empty);
        }
        Ok(claims)
    }
}
