//! job.rs: one complete batch run, collect → persist → export.

use anyhow::{Context, Result};
use metrics::gauge;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::OracleConfig;
use crate::export::write_csv;
use crate::ingest::reddit::RedditClient;
use crate::ingest::types::{SourceClient, SourceDiagnostic};
use crate::pipeline::{collect_batch, BatchOutcome, Enricher, RunOptions};
use crate::record::EnrichedRecord;
use crate::store::{PostStore, WriteOutcome};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExportOutcome {
    /// No export path configured.
    Skipped,
    Written { path: PathBuf, rows: usize },
    Failed { error: String },
}

/// What a run did. `Empty` means nothing was fetched, so nothing was written
/// or exported.
#[derive(Debug, Clone, PartialEq)]
pub enum RunReport {
    Empty {
        diagnostics: Vec<SourceDiagnostic>,
    },
    Completed {
        records: Vec<EnrichedRecord>,
        diagnostics: Vec<SourceDiagnostic>,
        write: WriteOutcome,
        export: ExportOutcome,
    },
}

impl RunReport {
    pub fn is_empty(&self) -> bool {
        matches!(self, RunReport::Empty { .. })
    }

    pub fn diagnostics(&self) -> &[SourceDiagnostic] {
        match self {
            RunReport::Empty { diagnostics } | RunReport::Completed { diagnostics, .. } => {
                diagnostics
            }
        }
    }

    pub fn records(&self) -> &[EnrichedRecord] {
        match self {
            RunReport::Empty { .. } => &[],
            RunReport::Completed { records, .. } => records,
        }
    }
}

/// Run with explicit collaborators. A failed store write does not stop the
/// export; both outcomes are reported.
pub async fn run_job<C>(
    client: C,
    store: &PostStore,
    opts: &RunOptions,
    enricher: &Enricher,
    csv_path: Option<&Path>,
) -> RunReport
where
    C: SourceClient,
{
    let batch = match collect_batch(client, opts, enricher).await {
        BatchOutcome::Empty { diagnostics } => {
            gauge!("oracle_last_run_ts").set(chrono::Utc::now().timestamp() as f64);
            return RunReport::Empty { diagnostics };
        }
        BatchOutcome::Ready(batch) => batch,
    };

    let write = store.insert_batch(&batch.records).await;

    let export = match csv_path {
        None => ExportOutcome::Skipped,
        Some(path) => match write_csv(path, &batch.records) {
            Ok(rows) => ExportOutcome::Written {
                path: path.to_path_buf(),
                rows,
            },
            Err(e) => {
                warn!(error = ?e, "csv export failed");
                ExportOutcome::Failed {
                    error: format!("{e:#}"),
                }
            }
        },
    };

    gauge!("oracle_last_run_ts").set(chrono::Utc::now().timestamp() as f64);
    RunReport::Completed {
        records: batch.records,
        diagnostics: batch.diagnostics,
        write,
        export,
    }
}

/// Production wiring: open the store, build the Reddit client, run once.
pub async fn run_from_config(cfg: &OracleConfig) -> Result<RunReport> {
    let store = PostStore::open(&cfg.db_path)
        .await
        .with_context(|| format!("opening store at {}", cfg.db_path.display()))?;

    let client = RedditClient::new(&cfg.reddit).context("building reddit client")?;
    let opts = RunOptions::from_config(cfg);
    let enricher = Enricher::from_config(cfg);

    info!(
        sources = ?opts.sources,
        sentiment = opts.enable_sentiment,
        chain = opts.enable_chain,
        "starting run"
    );
    let report = run_job(client, &store, &opts, &enricher, cfg.csv_path.as_deref()).await;
    store.close().await;
    Ok(report)
}
