//! Response cache for truthguard-runtime.
//!
//! Holds the last record list served for each scope so bursts of requests
//! within the TTL skip the store and every upstream service.

use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use truthguard_core::{Scope, VerifiedRecord};

/// Per-scope response cache using moka.
#[derive(Clone)]
pub struct ResponseCache {
    cache: Option<Cache<Scope, Arc<Vec<VerifiedRecord>>>>,
}

impl ResponseCache {
    /// Create a cache whose entries expire after `ttl`; zero disables caching.
    pub fn new(ttl: Duration) -> Self {
        if ttl.is_zero() {
            return Self::disabled();
        }

        let cache = Cache::builder()
            .max_capacity(Scope::ALL.len() as u64)
            .time_to_live(ttl)
            .build();

        Self { cache: Some(cache) }
    }

    /// A cache that never stores anything.
    pub fn disabled() -> Self {
        Self { cache: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.cache.is_some()
    }

    /// Get the cached response for a scope.
    pub async fn get(&self, scope: Scope) -> Option<Arc<Vec<VerifiedRecord>>> {
        self.cache.as_ref()?.get(&scope).await
    }

    /// Store the response for a scope.
    pub async fn insert(&self, scope: Scope, records: Arc<Vec<VerifiedRecord>>) {
        if let Some(cache) = &self.cache {
            cache.insert(scope, records).await;
        }
    }

}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(300))
    }
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
