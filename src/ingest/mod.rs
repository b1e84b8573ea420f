// src/ingest/mod.rs
pub mod reddit;
pub mod types;

use crate::ingest::types::{Post, SourceClient, SourceDiagnostic};
use futures::future::join_all;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_posts_total", "Posts fetched from all sources.");
        describe_counter!(
            "ingest_source_errors_total",
            "Sources whose fetch failed and contributed nothing."
        );
        describe_histogram!("ingest_fetch_ms", "Per-source fetch time in milliseconds.");
    });
}

/// Collapse runs of whitespace and trim. Listings are requested with
/// `raw_json=1`, so titles arrive as plain text and are otherwise kept verbatim.
pub fn normalize_text(s: &str) -> String {
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    re_ws.replace_all(s, " ").trim().to_string()
}

/// Posts (or the failure) for one source.
#[derive(Debug)]
pub struct SourceFetch {
    pub source: String,
    pub posts: Vec<Post>,
    pub error: Option<SourceDiagnostic>,
}

/// Fetch one source. Failures are logged and turned into an empty result.
pub async fn fetch_source<C>(client: &C, source: &str, limit: usize) -> SourceFetch
where
    C: SourceClient + ?Sized,
{
    ensure_metrics_described();
    let t0 = std::time::Instant::now();

    let result = client.hot(source, limit).await;
    histogram!("ingest_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

    match result {
        Ok(mut posts) => {
            posts.truncate(limit);
            tracing::info!(source, count = posts.len(), "fetched source");
            counter!("ingest_posts_total").increment(posts.len() as u64);
            SourceFetch {
                source: source.to_string(),
                posts,
                error: None,
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, source, "source unavailable");
            counter!("ingest_source_errors_total").increment(1);
            SourceFetch {
                source: source.to_string(),
                posts: Vec::new(),
                error: Some(SourceDiagnostic {
                    source: source.to_string(),
                    error: e.to_string(),
                }),
            }
        }
    }
}

/// Fetch every source concurrently on the current task and wait for all of
/// them. Results come back in the order the sources were given.
pub async fn fetch_all<C>(client: &C, sources: &[String], limit: usize) -> Vec<SourceFetch>
where
    C: SourceClient + ?Sized,
{
    join_all(sources.iter().map(|s| fetch_source(client, s, limit))).await
}
