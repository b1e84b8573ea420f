//! record.rs: rows produced by a run and rows read back from the store.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::signal::ChainSignal;

/// A fetched post plus its enrichment, as written to `posts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub id: String,
    #[serde(rename = "subreddit")]
    pub source: String,
    pub title: String,
    pub score: i64,
    /// Compound score in [-1, 1]; 0.0 when scoring is off.
    pub sentiment: f64,
    pub chain_signal: ChainSignal,
    /// UTC. `None` lets the store stamp the write time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingested_at: Option<NaiveDateTime>,
}

impl EnrichedRecord {
    /// `(id, subreddit, title, score, sentiment, chain_signal)`
    pub fn as_tuple(&self) -> (&str, &str, &str, i64, f64, &'static str) {
        (
            &self.id,
            &self.source,
            &self.title,
            self.score,
            self.sentiment,
            self.chain_signal.as_str(),
        )
    }
}

/// Typed row of the `posts` table, used by the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct StoredPost {
    pub id: String,
    pub subreddit: String,
    pub title: String,
    pub score: i64,
    pub sentiment: f64,
    /// Raw label; rows written by other tools may carry unknown values.
    pub chain_signal: String,
    pub timestamp: NaiveDateTime,
}

impl StoredPost {
    pub fn signal(&self) -> Option<ChainSignal> {
        ChainSignal::from_label(&self.chain_signal)
    }
}
