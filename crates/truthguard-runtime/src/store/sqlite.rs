//! SQLite record store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::collections::HashSet;
use truthguard_core::{Claim, Scope, VerdictLabel, VerifiedRecord};

use super::{InsertOutcome, RecordStore, StoreError};

/// Open a connection pool for a SQLite connection string.
///
/// In-memory databases are private to a connection, so they get a pool of one.
pub async fn open_pool(database_url: &str) -> Result<SqlitePool, StoreError> {
    let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

    tracing::info!(database_url, "Connecting to database");

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Record store backed by a shared SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    /// Wrap an existing pool, creating the schema if needed.
    pub async fn new(pool: SqlitePool) -> Result<Self, StoreError> {
        Self::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Open a pool and wrap it.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        Self::new(open_pool(database_url).await?).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn run_migrations(pool: &SqlitePool) -> Result<(), StoreError> {
        tracing::debug!("Running database migrations");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS verified_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL UNIQUE,
                url TEXT NOT NULL,
                source_label TEXT NOT NULL,
                scope TEXT NOT NULL CHECK (scope IN ('local', 'global')),
                verdict TEXT NOT NULL,
                truth_score INTEGER NOT NULL CHECK (truth_score BETWEEN 0 AND 100),
                propaganda_score INTEGER NOT NULL CHECK (propaganda_score BETWEEN 0 AND 100),
                category TEXT NOT NULL,
                explanation TEXT NOT NULL,
                image_keywords TEXT,
                evidence TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_verified_records_scope_created
            ON verified_records(scope, created_at)
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    async fn title_exists(&self, title: &str) -> Result<bool, StoreError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM verified_records WHERE title = ?")
            .bind(title)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RecordRow {
    title: String,
    url: String,
    source_label: String,
    scope: String,
    verdict: String,
    truth_score: i64,
    propaganda_score: i64,
    category: String,
    explanation: String,
    image_keywords: Option<String>,
    evidence: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<RecordRow> for VerifiedRecord {
    type Error = StoreError;

    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        let scope: Scope = row
            .scope
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("{}: {}", row.title, e)))?;
        let label: VerdictLabel = row
            .verdict
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("{}: {}", row.title, e)))?;
        let score = |value: i64| {
            u8::try_from(value)
                .ok()
                .filter(|s| *s <= truthguard_core::MAX_SCORE)
                .ok_or_else(|| StoreError::Corrupt(format!("{}: score {}", row.title, value)))
        };

        Ok(VerifiedRecord {
            truth_score: score(row.truth_score)?,
            propaganda_score: score(row.propaganda_score)?,
            title: row.title,
            url: row.url,
            source_label: row.source_label,
            scope,
            label,
            category: row.category,
            explanation: row.explanation,
            image_keywords: row.image_keywords,
            evidence: row.evidence,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn count(&self, scope: Scope) -> Result<u64, StoreError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM verified_records WHERE scope = ?")
                .bind(scope.as_str())
                .fetch_one(&self.pool)
                .await?;
        Ok(count.max(0) as u64)
    }

    async fn recent(&self, scope: Scope, limit: u32) -> Result<Vec<VerifiedRecord>, StoreError> {
        let rows: Vec<RecordRow> = sqlx::query_as(
            r#"
            SELECT title, url, source_label, scope, verdict, truth_score, propaganda_score,
                   category, explanation, image_keywords, evidence, created_at
            FROM verified_records
            WHERE scope = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(scope.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(VerifiedRecord::try_from).collect()
    }

    async fn filter_new(&self, claims: Vec<Claim>) -> Result<Vec<Claim>, StoreError> {
        let mut seen = HashSet::new();
        let mut fresh = Vec::with_capacity(claims.len());

        for claim in claims {
            if !seen.insert(claim.title.clone()) {
                continue;
            }
            if self.title_exists(&claim.title).await? {
                tracing::debug!(title = %claim.preview(), "Already verified, skipping");
                continue;
            }
            fresh.push(claim);
        }

        Ok(fresh)
    }

    async fn insert(&self, record: &VerifiedRecord) -> Result<InsertOutcome, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO verified_records (
                title, url, source_label, scope, verdict, truth_score, propaganda_score,
                category, explanation, image_keywords, evidence, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(title) DO NOTHING
            "#,
        )
        .bind(&record.title)
        .bind(&record.url)
        .bind(&record.source_label)
        .bind(record.scope.as_str())
        .bind(record.label.as_str())
        .bind(i64::from(record.truth_score))
        .bind(i64::from(record.propaganda_score))
        .bind(&record.category)
        .bind(&record.explanation)
        .bind(&record.image_keywords)
        .bind(&record.evidence)
        .bind(record.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            tracing::info!(title = %record.title, "Duplicate record skipped");
            Ok(InsertOutcome::Duplicate)
        } else {
            Ok(InsertOutcome::Inserted)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use truthguard_core::{Evidence, Verdict};

    async fn store() -> SqliteRecordStore {
        SqliteRecordStore::connect("sqlite::memory:").await.unwrap()
    }

    fn record(title: &str, scope: Scope, minutes: i64) -> VerifiedRecord {
        let verdict = Verdict::from_model_output(
            r#"{"verdict":"Fake","truthScore":5,"propagandaScore":90,"category":"Politics","explanation":"Fabricated quote."}"#,
        )
        .unwrap();
        let created = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap() + Duration::minutes(minutes);
        VerifiedRecord::assemble(
            Claim::new(title, "https://x.test", "r/nepalnews"),
            verdict,
            scope,
            &Evidence::NoMatch,
            created,
        )
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_a_noop() {
        let store = store().await;
        let first = record("Minister resigns over bridge scandal", Scope::Local, 0);

        assert_eq!(store.insert(&first).await.unwrap(), InsertOutcome::Inserted);

        let mut second = first.clone();
        second.explanation = "Different explanation".to_string();
        assert_eq!(store.insert(&second).await.unwrap(), InsertOutcome::Duplicate);

        let stored = store.recent(Scope::Local, 20).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].explanation, "Fabricated quote.");
    }

    #[tokio::test]
    async fn test_recent_is_newest_first_bounded_and_scoped() {
        let store = store().await;
        for i in 0..5 {
            store
                .insert(&record(&format!("Local headline number {i}"), Scope::Local, i))
                .await
                .unwrap();
        }
        store
            .insert(&record("Global headline number one", Scope::Global, 10))
            .await
            .unwrap();

        let recent = store.recent(Scope::Local, 3).await.unwrap();
        let titles: Vec<_> = recent.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Local headline number 4", "Local headline number 3", "Local headline number 2"]
        );
        assert_eq!(store.count(Scope::Local).await.unwrap(), 5);
        assert_eq!(store.count(Scope::Global).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_filter_new_is_exact_and_case_sensitive() {
        let store = store().await;
        store
            .insert(&record("Fuel prices cut by ten percent", Scope::Local, 0))
            .await
            .unwrap();

        let claims = vec![
            Claim::new("Fuel prices cut by ten percent", "u1", "r/a"),
            Claim::new("FUEL PRICES CUT BY TEN PERCENT", "u2", "r/a"),
            Claim::new("Fuel prices cut by ten percent!", "u3", "r/a"),
        ];
        let fresh = store.filter_new(claims).await.unwrap();

        let urls: Vec<_> = fresh.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(urls, vec!["u2", "u3"]);
    }

    #[tokio::test]
    async fn test_filter_new_collapses_batch_duplicates() {
        let store = store().await;
        let claims = vec![
            Claim::new("Same headline posted twice today", "first", "r/a"),
            Claim::new("Same headline posted twice today", "second", "r/b"),
        ];

        let fresh = store.filter_new(claims).await.unwrap();

        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].url, "first");
    }

    #[tokio::test]
    async fn test_round_trip_preserves_fields() {
        let store = store().await;
        let mut original = record("Earthquake drill scheduled for Friday", Scope::Global, 0);
        original.image_keywords = Some("earthquake drill".to_string());
        store.insert(&original).await.unwrap();

        let loaded = store.recent(Scope::Global, 1).await.unwrap().remove(0);
        assert_eq!(loaded, original);
    }

    #[tokio::test]
    async fn test_out_of_range_scores_rejected_by_schema() {
        let store = store().await;
        let result = sqlx::query(
            "INSERT INTO verified_records (title, url, source_label, scope, verdict, truth_score, \
             propaganda_score, category, explanation, evidence, created_at) \
             VALUES ('t', 'u', 's', 'local', 'Real', 101, 0, 'c', 'e', 'no-match', '2026-01-01T00:00:00+00:00')",
        )
        .execute(store.pool())
        .await;
        assert!(result.is_err());
    }
}
