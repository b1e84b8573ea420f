use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::path::Path;

#[derive(Clone)]
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Call once per process.
    pub fn install() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        Ok(Self { handle })
    }

    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// Dump the current exposition to a file (node_exporter textfile collector).
    pub fn write_textfile(&self, path: &Path) -> Result<()> {
        let tmp = path.with_extension("prom.tmp");
        std::fs::write(&tmp, self.render())
            .with_context(|| format!("writing metrics to {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("moving metrics into {}", path.display()))?;
        Ok(())
    }

    /// `GET /metrics` in text exposition format; merged into the dashboard app.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route("/metrics", get(move || std::future::ready(handle.render())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn textfile_is_written_atomically() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let m = Metrics {
            handle: recorder.handle(),
        };
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("oracle.prom");
        m.write_textfile(&p).unwrap();
        assert!(p.exists());
        assert!(!dir.path().join("oracle.prom.tmp").exists());
    }

    #[tokio::test]
    async fn router_serves_exposition() {
        use axum::body::{to_bytes, Body};
        use axum::http::{Request, StatusCode};
        use tower::ServiceExt as _;

        let recorder = PrometheusBuilder::new().build_recorder();
        let m = Metrics {
            handle: recorder.handle(),
        };
        let resp = m
            .router()
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
        assert!(std::str::from_utf8(&body).is_ok());
    }
}
