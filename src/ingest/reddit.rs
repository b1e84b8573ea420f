// src/ingest/reddit.rs
//! Reddit listing client over the public JSON endpoints (`/r/{sub}/hot.json`).

use async_trait::async_trait;
use reqwest::{header, redirect, Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use crate::config::RedditConfig;
use crate::ingest::normalize_text;
use crate::ingest::types::{FetchError, Post, SourceClient};

/// Reddit caps a single listing page at 100 items.
const MAX_PAGE: usize = 100;

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
    after: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Link,
}

#[derive(Debug, Deserialize)]
struct Link {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    score: i64,
}

pub struct RedditClient {
    base_url: String,
    client: Client,
}

impl RedditClient {
    pub fn new(cfg: &RedditConfig) -> Result<Self, FetchError> {
        // Unknown communities redirect to a search page; treat that as a failure.
        let client = Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .redirect(redirect::Policy::none())
            .build()?;
        Ok(Self {
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn page(
        &self,
        source: &str,
        limit: usize,
        after: Option<&str>,
    ) -> Result<ListingData, FetchError> {
        let url = format!("{}/r/{}/hot.json", self.base_url, source);
        let mut query: Vec<(&str, String)> =
            vec![("limit", limit.to_string()), ("raw_json", "1".into())];
        if let Some(cursor) = after {
            query.push(("after", cursor.to_string()));
        }

        let resp = self
            .client
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .query(&query)
            .send()
            .await?;

        match resp.status() {
            s if s.is_success() => {}
            StatusCode::NOT_FOUND => return Err(FetchError::NotFound),
            StatusCode::TOO_MANY_REQUESTS => return Err(FetchError::Throttled),
            s => return Err(FetchError::Status(s.as_u16())),
        }

        let body = resp.text().await?;
        let listing: Listing = serde_json::from_str(&body)?;
        Ok(listing.data)
    }
}

#[async_trait]
impl SourceClient for RedditClient {
    async fn hot(&self, source: &str, limit: usize) -> Result<Vec<Post>, FetchError> {
        let mut out: Vec<Post> = Vec::with_capacity(limit.min(MAX_PAGE));
        let mut after: Option<String> = None;

        while out.len() < limit {
            let want = (limit - out.len()).min(MAX_PAGE);
            let page = self.page(source, want, after.as_deref()).await?;
            let fetched = page.children.len();

            for child in page.children.into_iter().take(limit - out.len()) {
                out.push(Post {
                    id: child.data.id,
                    source: source.to_string(),
                    title: normalize_text(&child.data.title),
                    score: child.data.score,
                });
            }

            tracing::debug!(source, fetched, total = out.len(), "listing page");
            match page.after {
                Some(cursor) if fetched > 0 => after = Some(cursor),
                _ => break,
            }
        }

        Ok(out)
    }
}
