// src/ingest/types.rs
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Raw item as fetched, before enrichment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    pub id: String,     // unique within its source
    pub source: String, // e.g. "ethereum"
    pub title: String,  // normalized title
    pub score: i64,     // upvotes minus downvotes, may be <= 0
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("source not found")]
    NotFound,
    #[error("throttled by upstream (HTTP 429)")]
    Throttled,
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("malformed listing: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Upstream community client. One instance serves every source of a run.
#[async_trait::async_trait]
pub trait SourceClient: Send + Sync {
    /// Up to `limit` posts from `source`, in the source's "hot" order.
    async fn hot(&self, source: &str, limit: usize) -> Result<Vec<Post>, FetchError>;
}

#[async_trait::async_trait]
impl<T: SourceClient + ?Sized> SourceClient for Arc<T> {
    async fn hot(&self, source: &str, limit: usize) -> Result<Vec<Post>, FetchError> {
        (**self).hot(source, limit).await
    }
}

/// A source that failed this run. Recorded, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceDiagnostic {
    pub source: String,
    pub error: String,
}
