//! Feed source polling.

use std::time::Duration;

use async_trait::async_trait;
use curator_core::{Error, Result};
use tracing::{debug, warn};

use crate::config::FeedConfig;
use crate::parser::{parse_rss, ParsedFeed};

/// Source of normalized feed items.
///
/// Implementations report any failure to deliver the document as
/// `Error::SourceUnavailable`; the run cannot continue without it.
#[async_trait]
pub trait FeedProvider: Send + Sync {
    /// Fetches and normalizes the feed at `url`.
    async fn fetch(&self, url: &str) -> Result<ParsedFeed>;
}

/// Polls RSS sources over HTTP.
pub struct HttpFeedProvider {
    client: reqwest::Client,
}

impl HttpFeedProvider {
    pub fn new(config: &FeedConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::feed(format!("building http client: {e}")))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl FeedProvider for HttpFeedProvider {
    async fn fetch(&self, url: &str) -> Result<ParsedFeed> {
        if url.starts_with("rsshub://") {
            return Err(Error::source_unavailable(url, "rsshub routes are not supported"));
        }

        let response = self.client.get(url).send().await.map_err(|e| {
            warn!(url = url, error = %e, "Source request failed");
            Error::source_unavailable(url, e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::source_unavailable(url, format!("HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::source_unavailable(url, format!("reading body: {e}")))?;
        debug!(url = url, bytes = body.len(), "Fetched source");

        parse_rss(&body)
    }
}
