//! Quant Oracle batch entrypoint.
//! One run: fetch every configured source, enrich, persist, export.
//!
//! Configuration comes from `config/oracle.toml` (or `$ORACLE_CONFIG_PATH`)
//! plus environment overrides; see `OracleConfig`.

use anyhow::Result;
use quant_oracle::job::ExportOutcome;
use quant_oracle::metrics::Metrics;
use quant_oracle::{init_tracing, run_from_config, OracleConfig, RunReport, WriteOutcome};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = OracleConfig::load_default()?;
    let metrics = match cfg.metrics_path {
        Some(_) => Some(Metrics::install()?),
        None => None,
    };

    let report = run_from_config(&cfg).await?;

    for d in report.diagnostics() {
        warn!(source = %d.source, error = %d.error, "source skipped");
    }

    match &report {
        RunReport::Empty { .. } => info!("no data collected"),
        RunReport::Completed { write, export, .. } => {
            let records = report.records();
            match write {
                WriteOutcome::Written { inserted, .. } => {
                    info!(records = records.len(), inserted, "run complete")
                }
                WriteOutcome::Failed { error } => {
                    warn!(records = records.len(), %error, "run complete, 0 rows saved")
                }
            }
            if let ExportOutcome::Written { path, rows } = export {
                info!(rows, path = %path.display(), "feed exported");
            }
        }
    }

    if let (Some(m), Some(path)) = (metrics, cfg.metrics_path.as_deref()) {
        if let Err(e) = m.write_textfile(path) {
            warn!(error = ?e, "metrics snapshot not written");
        }
    }

    Ok(())
}
