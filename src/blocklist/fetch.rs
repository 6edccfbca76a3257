use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::{stream, StreamExt};
use reqwest::Client;
use std::time::Duration;
use tracing::{error, info};

/// Outcome of fetching one blocklist source. A failed source carries the
/// error text for logging; it never aborts the other sources.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub url: String,
    pub content: Option<String>,
    pub error: Option<String>,
}

impl FetchResult {
    pub fn ok(url: String, content: String) -> Self {
        Self {
            url,
            content: Some(content),
            error: None,
        }
    }

    pub fn failed(url: String, error: String) -> Self {
        Self {
            url,
            content: None,
            error: Some(error),
        }
    }
}

/// Seam for the blocklist download step so tests can substitute canned
/// content.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch every URL independently, preserving input order. No retry
    /// within one invocation; retry happens on the next cycle.
    async fn fetch_all(&self, urls: &[String]) -> Vec<FetchResult>;
}

pub struct HttpFetcher {
    client: Client,
    concurrency: usize,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, concurrency: usize) -> Result<Self> {
        let client = Client::builder()
            .user_agent("adblockd/0.1")
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            concurrency: concurrency.max(1),
        })
    }

    async fn fetch_one(&self, url: &str) -> FetchResult {
        let url = url.trim();
        info!("Fetching blocklist from {}", url);
        let response = match self.client.get(url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                error!("Failed to fetch {}: {}", url, e);
                return FetchResult::failed(url.to_string(), e.to_string());
            }
        };
        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                error!("Failed to fetch {}: {}", url, e);
                return FetchResult::failed(url.to_string(), e.to_string());
            }
        };
        match response.text().await {
            Ok(body) => {
                info!("Fetched {} bytes from {}", body.len(), url);
                FetchResult::ok(url.to_string(), body)
            }
            Err(e) => {
                error!("Failed to read body from {}: {}", url, e);
                FetchResult::failed(url.to_string(), e.to_string())
            }
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_all(&self, urls: &[String]) -> Vec<FetchResult> {
        // `buffered` keeps results in input order so the combined content
        // fingerprint is stable across runs.
        let fetches: Vec<_> = urls.iter().map(|url| self.fetch_one(url)).collect();
        stream::iter(fetches)
            .buffered(self.concurrency)
            .collect()
            .await
    }
}
