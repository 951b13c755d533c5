//! Deduplication & Persistence Gate.
//!
//! The store is append-only and keyed by claim title. Matching is exact
//! and case-sensitive.

use async_trait::async_trait;
use thiserror::Error;
use truthguard_core::{Claim, Scope, VerifiedRecord};

mod sqlite;

pub use sqlite::{open_pool, SqliteRecordStore};

/// Errors from the record store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Stored record is corrupt: {0}")]
    Corrupt(String),
}

/// Result of persisting a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,

    /// A record with the same title already exists; nothing was written
    Duplicate,
}

/// Persistent storage of verified records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Number of records in a scope.
    async fn count(&self, scope: Scope) -> Result<u64, StoreError>;

    /// Newest records in a scope, at most `limit`.
    async fn recent(&self, scope: Scope, limit: u32) -> Result<Vec<VerifiedRecord>, StoreError>;

    /// Claims whose titles are not yet stored, first occurrence only.
    async fn filter_new(&self, claims: Vec<Claim>) -> Result<Vec<Claim>, StoreError>;

    /// Persist a record unless its title is already stored.
    async fn insert(&self, record: &VerifiedRecord) -> Result<InsertOutcome, StoreError>;
}
