//! Read-only dashboard API over the `posts` table.
//!
//! - `GET /health`
//! - `GET /api/summary`  header metrics (global sentiment, alpha signals, whales)
//! - `GET /api/posts`    feed, newest first, `?min_sentiment=&limit=`
//! - `GET /api/heatmap`  timeline points colored by chain signal

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::NaiveDateTime;
use metrics::counter;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::record::StoredPost;
use crate::signal::ChainSignal;
use crate::store::{PostFilter, PostStore, StoreError};

#[derive(Clone)]
pub struct DashboardState {
    pub store: PostStore,
}

pub fn router(state: DashboardState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/summary", get(summary))
        .route("/api/posts", get(posts))
        .route("/api/heatmap", get(heatmap))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Store read failures surface as 503 with the reason.
struct ApiError(StoreError);

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self.0, "dashboard store read failed");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            format!("store unavailable: {}", self.0),
        )
            .into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryOut {
    pub total: i64,
    pub avg_sentiment: f64,
    pub alpha_signals: i64,
    pub whale_alerts: i64,
    /// "Bullish" | "Bearish" | "Empty"
    pub mood: String,
}

async fn summary(State(state): State<DashboardState>) -> Result<Json<SummaryOut>, ApiError> {
    counter!("dashboard_requests_total", "endpoint" => "summary").increment(1);
    let s = state.store.summary().await?;
    let mood = if s.total == 0 {
        "Empty"
    } else if s.avg_sentiment > 0.0 {
        "Bullish"
    } else {
        "Bearish"
    };
    Ok(Json(SummaryOut {
        total: s.total,
        avg_sentiment: s.avg_sentiment,
        alpha_signals: s.alpha_signals,
        whale_alerts: s.whale_alerts,
        mood: mood.to_string(),
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct PostsQuery {
    pub min_sentiment: Option<f64>,
    pub limit: Option<u32>,
}

async fn posts(
    State(state): State<DashboardState>,
    Query(q): Query<PostsQuery>,
) -> Result<Json<Vec<StoredPost>>, ApiError> {
    counter!("dashboard_requests_total", "endpoint" => "posts").increment(1);
    let min = q
        .min_sentiment
        .filter(|v| v.is_finite())
        .map(|v| v.clamp(-1.0, 1.0));
    let rows = state
        .store
        .load_posts(PostFilter {
            min_sentiment: min,
            limit: q.limit,
        })
        .await?;
    Ok(Json(rows))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HeatPoint {
    pub timestamp: NaiveDateTime,
    pub sentiment: f64,
    pub chain_signal: String,
    pub color: String,
}

/// Marker color per signal; unknown labels fall back to green like `N/A`.
pub fn signal_color(label: &str) -> &'static str {
    match ChainSignal::from_label(label) {
        Some(ChainSignal::LowGas) => "gray",
        Some(ChainSignal::Normal) => "blue",
        Some(ChainSignal::WhaleAlert) => "red",
        Some(ChainSignal::NotApplicable) | None => "green",
    }
}

async fn heatmap(State(state): State<DashboardState>) -> Result<Json<Vec<HeatPoint>>, ApiError> {
    counter!("dashboard_requests_total", "endpoint" => "heatmap").increment(1);
    let rows = state.store.load_posts(PostFilter::default()).await?;
    let points = rows
        .into_iter()
        .map(|p| HeatPoint {
            color: signal_color(&p.chain_signal).to_string(),
            timestamp: p.timestamp,
            sentiment: p.sentiment,
            chain_signal: p.chain_signal,
        })
        .collect();
    Ok(Json(points))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_follow_signal() {
        assert_eq!(signal_color("LOW_GAS"), "gray");
        assert_eq!(signal_color("NORMAL"), "blue");
        assert_eq!(signal_color("WHALE_ALERT"), "red");
        assert_eq!(signal_color("N/A"), "green");
        assert_eq!(signal_color("something else"), "green");
    }
}
