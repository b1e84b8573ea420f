//! Read-only dashboard API over the oracle store.

use anyhow::{Context, Result};
use quant_oracle::dashboard::{self, DashboardState};
use quant_oracle::metrics::Metrics;
use quant_oracle::{init_tracing, OracleConfig, PostStore};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = OracleConfig::load_default()?;
    let metrics = Metrics::install()?;
    let store = PostStore::open(&cfg.db_path)
        .await
        .with_context(|| format!("opening store at {}", cfg.db_path.display()))?;

    let app = dashboard::router(DashboardState { store }).merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(&cfg.dashboard.bind_addr)
        .await
        .with_context(|| format!("binding {}", cfg.dashboard.bind_addr))?;
    tracing::info!(addr = %cfg.dashboard.bind_addr, "dashboard listening");

    axum::serve(listener, app).await.context("dashboard server")?;
    Ok(())
}
