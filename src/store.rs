//! # Store
//! SQLite-backed `posts` table with insert-or-ignore writes.
//!
//! - `open` creates the file if needed, enables WAL so the dashboard can read
//!   while a run writes, and creates the schema idempotently.
//! - `insert_batch` writes a whole run in one transaction. Existing ids are
//!   skipped (first write wins). Failures are reported, never propagated.

use metrics::counter;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::time::Duration;
use tracing::{error, info};

use crate::record::{EnrichedRecord, StoredPost};
use crate::signal::ChainSignal;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("preparing database directory: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of a batch write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WriteOutcome {
    /// Committed. `inserted` excludes ids that were already stored.
    Written { attempted: usize, inserted: u64 },
    /// Rolled back; nothing from this batch is durable.
    Failed { error: String },
}

impl WriteOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, WriteOutcome::Written { .. })
    }

    pub fn inserted(&self) -> u64 {
        match self {
            WriteOutcome::Written { inserted, .. } => *inserted,
            WriteOutcome::Failed { .. } => 0,
        }
    }
}

/// Read filter for `load_posts`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostFilter {
    pub min_sentiment: Option<f64>,
    pub limit: Option<u32>,
}

/// Aggregates shown on the dashboard header.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub total: i64,
    pub avg_sentiment: f64,
    /// Rows with sentiment > 0.5.
    pub alpha_signals: i64,
    pub whale_alerts: i64,
}

const ALPHA_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone)]
pub struct PostStore {
    pool: SqlitePool,
}

impl PostStore {
    /// Open (or create) the database file and make sure the schema exists.
    pub async fn open(db_path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init().await?;
        info!(path = %db_path.display(), "post store ready");
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create table and index if absent. Safe to call on every run.
    pub async fn init(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS posts (
                id TEXT PRIMARY KEY,
                subreddit TEXT,
                title TEXT,
                score INTEGER,
                sentiment REAL,
                chain_signal TEXT,
                timestamp DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_sentiment ON posts(sentiment)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Write the batch atomically. Never returns an error; check the outcome.
    pub async fn insert_batch(&self, records: &[EnrichedRecord]) -> WriteOutcome {
        match self.try_insert_batch(records).await {
            Ok(inserted) => {
                counter!("store_rows_inserted_total").increment(inserted);
                info!(
                    attempted = records.len(),
                    inserted,
                    skipped = records.len() as u64 - inserted,
                    "saved batch"
                );
                WriteOutcome::Written {
                    attempted: records.len(),
                    inserted,
                }
            }
            Err(e) => {
                counter!("store_write_failures_total").increment(1);
                error!(error = %e, attempted = records.len(), "batch write failed, nothing saved");
                WriteOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    /// Same as `insert_batch` but surfaces the error. Returns newly inserted rows.
    pub async fn try_insert_batch(&self, records: &[EnrichedRecord]) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;

        for r in records {
            let res = sqlx::query(
                r#"
                INSERT OR IGNORE INTO posts
                    (id, subreddit, title, score, sentiment, chain_signal, timestamp)
                VALUES (?, ?, ?, ?, ?, ?, COALESCE(?, CURRENT_TIMESTAMP))
                "#,
            )
            .bind(&r.id)
            .bind(&r.source)
            .bind(&r.title)
            .bind(r.score)
            .bind(r.sentiment)
            .bind(r.chain_signal.as_str())
            .bind(r.ingested_at)
            .execute(&mut *tx)
            .await?;
            inserted += res.rows_affected();
        }

        // Dropping `tx` on an early return above rolls back.
        tx.commit().await?;
        Ok(inserted)
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    /// Rows newest first, optionally filtered by minimum sentiment.
    pub async fn load_posts(&self, filter: PostFilter) -> Result<Vec<StoredPost>, StoreError> {
        let rows = sqlx::query_as::<_, StoredPost>(
            r#"
            SELECT id,
                   COALESCE(subreddit, '') AS subreddit,
                   COALESCE(title, '') AS title,
                   COALESCE(score, 0) AS score,
                   COALESCE(sentiment, 0.0) AS sentiment,
                   COALESCE(chain_signal, 'N/A') AS chain_signal,
                   COALESCE(timestamp, CURRENT_TIMESTAMP) AS timestamp
            FROM posts
            WHERE COALESCE(sentiment, 0.0) >= ?
            ORDER BY timestamp DESC, id ASC
            LIMIT ?
            "#,
        )
        .bind(filter.min_sentiment.unwrap_or(-1.0))
        .bind(filter.limit.map(i64::from).unwrap_or(-1))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn summary(&self) -> Result<Summary, StoreError> {
        let (total, avg, alpha, whales): (i64, Option<f64>, Option<i64>, Option<i64>) =
            sqlx::query_as(
                r#"
                SELECT COUNT(*),
                       AVG(sentiment),
                       SUM(CASE WHEN sentiment > ? THEN 1 ELSE 0 END),
                       SUM(CASE WHEN chain_signal = ? THEN 1 ELSE 0 END)
                FROM posts
                "#,
            )
            .bind(ALPHA_THRESHOLD)
            .bind(ChainSignal::WhaleAlert.as_str())
            .fetch_one(&self.pool)
            .await?;

        Ok(Summary {
            total,
            avg_sentiment: avg.unwrap_or(0.0),
            alpha_signals: alpha.unwrap_or(0),
            whale_alerts: whales.unwrap_or(0),
        })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
