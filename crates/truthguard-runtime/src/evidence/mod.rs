//! Evidence retrieval from trusted outlets.
//!
//! A retriever never fails: every outcome, including a missing credential
//! or a broken search service, maps onto an [`Evidence`] value.

use async_trait::async_trait;
use truthguard_core::{Evidence, Scope};

mod newsapi;

pub use newsapi::{NewsApiRetriever, NEWS_API_KEY_ENV};

/// Looks up trusted coverage for a claim.
#[async_trait]
pub trait EvidenceRetriever: Send + Sync {
    /// Gather evidence for a claim title within a scope's trusted domains.
    async fn retrieve(&self, title: &str, scope: Scope) -> Evidence;
}
