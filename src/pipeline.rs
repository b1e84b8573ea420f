//! # Enrichment pipeline
//! fetch (all sources, concurrently) → score → simulate → assemble.
//!
//! Nothing is enriched until every source has finished. A failed source adds
//! a diagnostic and no rows; a run that fetched nothing at all ends as
//! [`BatchOutcome::Empty`].

use metrics::counter;
use tracing::{debug, info, warn};

use crate::config::OracleConfig;
use crate::ingest::fetch_all;
use crate::ingest::types::{Post, SourceClient, SourceDiagnostic};
use crate::record::EnrichedRecord;
use crate::sentiment::SentimentAnalyzer;
use crate::signal::{ChainSignal, ChainSimulator, Pacing, RandomDelay};

/// Inputs of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub sources: Vec<String>,
    pub limit: usize,
    pub enable_sentiment: bool,
    pub enable_chain: bool,
}

impl RunOptions {
    pub fn from_config(cfg: &OracleConfig) -> Self {
        Self {
            sources: cfg.sources.clone(),
            limit: cfg.limit,
            enable_sentiment: cfg.enable_sentiment,
            enable_chain: cfg.enable_chain,
        }
    }
}

/// Per-post enrichment. Each stage exists only when its flag is on.
#[derive(Debug, Default)]
pub struct Enricher {
    analyzer: Option<SentimentAnalyzer>,
    simulator: Option<ChainSimulator>,
}

impl Enricher {
    pub fn new(analyzer: Option<SentimentAnalyzer>, simulator: Option<ChainSimulator>) -> Self {
        Self {
            analyzer,
            simulator,
        }
    }

    /// Build the stages the flags ask for. The lexicon is built here, once.
    pub fn for_run(opts: &RunOptions, pacing: impl Pacing + 'static) -> Self {
        Self {
            analyzer: opts
                .enable_sentiment
                .then(SentimentAnalyzer::with_domain_terms),
            simulator: opts.enable_chain.then(|| ChainSimulator::new(pacing)),
        }
    }

    pub fn from_config(cfg: &OracleConfig) -> Self {
        let pacing = RandomDelay::from_millis(cfg.chain_delay.min_ms, cfg.chain_delay.max_ms);
        Self::for_run(&RunOptions::from_config(cfg), pacing)
    }

    pub async fn enrich(&self, post: Post) -> EnrichedRecord {
        let sentiment = match &self.analyzer {
            Some(a) => score_title(a, &post.id, &post.title),
            None => 0.0,
        };
        let chain_signal = match &self.simulator {
            Some(s) => s.simulate().await,
            None => ChainSignal::NotApplicable,
        };
        EnrichedRecord {
            id: post.id,
            source: post.source,
            title: post.title,
            score: post.score,
            sentiment,
            chain_signal,
            ingested_at: None,
        }
    }

    /// Enrich in order. Simulated lookups are paced one after another.
    pub async fn enrich_all(&self, posts: Vec<Post>) -> Vec<EnrichedRecord> {
        let mut out = Vec::with_capacity(posts.len());
        for post in posts {
            out.push(self.enrich(post).await);
        }
        counter!("enrich_records_total").increment(out.len() as u64);
        out
    }
}

/// Compound score for one title; anything outside [-1, 1] counts as neutral.
pub fn score_title(analyzer: &SentimentAnalyzer, id: &str, title: &str) -> f64 {
    let c = analyzer.compound(title);
    let s = sanitize(c);
    if s != c {
        warn!(id, compound = c, "unusable sentiment score, using 0.0");
    }
    s
}

/// 0.0 unless `c` is a finite value in [-1, 1].
fn sanitize(c: f64) -> f64 {
    if c.is_finite() && (-1.0..=1.0).contains(&c) {
        c
    } else {
        0.0
    }
}

/// Rows ready to persist plus the sources that failed along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub records: Vec<EnrichedRecord>,
    pub diagnostics: Vec<SourceDiagnostic>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    /// No source produced anything. Nothing to persist or export.
    Empty { diagnostics: Vec<SourceDiagnostic> },
    Ready(Batch),
}

impl BatchOutcome {
    pub fn diagnostics(&self) -> &[SourceDiagnostic] {
        match self {
            BatchOutcome::Empty { diagnostics } => diagnostics,
            BatchOutcome::Ready(b) => &b.diagnostics,
        }
    }
}

/// Run the whole fetch-and-enrich stage. Takes ownership of the client and
/// releases it as soon as the fetch phase is over.
pub async fn collect_batch<C>(client: C, opts: &RunOptions, enricher: &Enricher) -> BatchOutcome
where
    C: SourceClient,
{
    info!(sources = ?opts.sources, limit = opts.limit, "fetching sources");
    let fetched = fetch_all(&client, &opts.sources, opts.limit).await;
    drop(client);
    debug!("source client released");

    let mut posts = Vec::new();
    let mut diagnostics = Vec::new();
    for f in fetched {
        if let Some(d) = f.error {
            diagnostics.push(d);
        }
        posts.extend(f.posts);
    }

    if posts.is_empty() {
        info!(failed = diagnostics.len(), "no data collected");
        return BatchOutcome::Empty { diagnostics };
    }

    let records = enricher.enrich_all(posts).await;
    info!(
        records = records.len(),
        failed = diagnostics.len(),
        "batch enriched"
    );
    BatchOutcome::Ready(Batch {
        records,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::NoDelay;

    fn post(id: &str, title: &str) -> Post {
        Post {
            id: id.into(),
            source: "s".into(),
            title: title.into(),
            score: 7,
        }
    }

    #[tokio::test]
    async fn disabled_stages_use_defaults() {
        let e = Enricher::default();
        let r = e.enrich(post("p", "to the moon")).await;
        assert_eq!(r.sentiment, 0.0);
        assert_eq!(r.chain_signal, ChainSignal::NotApplicable);
        assert_eq!(r.score, 7);
    }

    #[tokio::test]
    async fn enabled_stages_fill_both_fields() {
        let opts = RunOptions {
            sources: vec!["s".into()],
            limit: 1,
            enable_sentiment: true,
            enable_chain: true,
        };
        let e = Enricher::for_run(&opts, NoDelay);
        let r = e.enrich(post("p", "to the moon")).await;
        assert!(r.sentiment > 0.0);
        assert_ne!(r.chain_signal, ChainSignal::NotApplicable);
    }

    #[test]
    fn sanitize_zeroes_unusable_scores() {
        assert_eq!(sanitize(f64::NAN), 0.0);
        assert_eq!(sanitize(f64::INFINITY), 0.0);
        assert_eq!(sanitize(1.5), 0.0);
        assert_eq!(sanitize(-1.0001), 0.0);
        assert_eq!(sanitize(1.0), 1.0);
        assert_eq!(sanitize(-0.42), -0.42);
    }

    #[test]
    fn score_title_passes_through_valid_scores() {
        let a = SentimentAnalyzer::with_domain_terms();
        assert_eq!(score_title(&a, "x", ""), 0.0);
        assert!(score_title(&a, "x", "total rug") < 0.0);
    }
}
