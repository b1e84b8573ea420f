// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod config;
pub mod dashboard;
pub mod export;
pub mod ingest;
pub mod job;
pub mod metrics;
pub mod pipeline;
pub mod record;
pub mod sentiment;
pub mod signal;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::config::OracleConfig;
pub use crate::ingest::types::{FetchError, Post, SourceClient, SourceDiagnostic};
pub use crate::job::{run_from_config, run_job, ExportOutcome, RunReport};
pub use crate::pipeline::{collect_batch, BatchOutcome, Enricher, RunOptions};
pub use crate::record::{EnrichedRecord, StoredPost};
pub use crate::signal::ChainSignal;
pub use crate::store::{PostStore, WriteOutcome};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the tracing subscriber used by both binaries.
///
/// `RUST_LOG` wins when set; otherwise `quant_oracle=info,warn`.
/// `ORACLE_LOG_JSON=1` switches to JSON lines.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("quant_oracle=info,warn"));

    let json = std::env::var("ORACLE_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    }
}
