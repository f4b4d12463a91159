//! The plugin contract for enrichment stages.

use async_trait::async_trait;
use curator_core::FeedItem;
use thiserror::Error;

/// Why a plugin could not transform an item.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("unexpected response: {0}")]
    Parse(String),

    #[error("{0}")]
    Other(String),
}

/// A named per-item transform.
///
/// A plugin receives an owned item and returns the transformed item. It may
/// modify `title`, `description` and `pub_date` and may add `extra` keys.
/// It must not change `guid` or remove `extra` keys; the pipeline reverts
/// outputs that do.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Stage name used to select the plugin.
    fn name(&self) -> &str;

    async fn process_item(&self, item: FeedItem) -> Result<FeedItem, PluginError>;
}
