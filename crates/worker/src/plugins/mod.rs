//! Built-in enrichment plugins.

pub mod cnbeta_fetch_content;
pub mod fetch_content;
pub mod fetch_meta;
pub mod hn_fetch_comments;
mod http;
pub mod zaihuapd_clean_description;

use curator_core::limits::{
    DEFAULT_MAX_CONTENT_CHARS, DEFAULT_PLUGIN_TIMEOUT_SECS, DEFAULT_PLUGIN_USER_AGENT,
};
use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::plugin::PluginError;

pub use cnbeta_fetch_content::CnbetaFetchContent;
pub use fetch_content::FetchContent;
pub use fetch_meta::FetchMeta;
pub use hn_fetch_comments::HnFetchComments;
pub use http::build_client;
pub use zaihuapd_clean_description::ZaihuapdCleanDescription;

/// Settings shared by the built-in plugins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Upper bound on extracted page text, in characters
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
    /// User agent sent when fetching article pages
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Base URL of the Hacker News item API
    #[serde(default = "default_hn_api_base")]
    pub hn_api_base: String,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_PLUGIN_TIMEOUT_SECS
}

fn default_max_content_chars() -> usize {
    DEFAULT_MAX_CONTENT_CHARS
}

fn default_user_agent() -> String {
    DEFAULT_PLUGIN_USER_AGENT.to_string()
}

fn default_hn_api_base() -> String {
    "https://hn.algolia.com/api/v1".to_string()
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_content_chars: default_max_content_chars(),
            user_agent: default_user_agent(),
            hn_api_base: default_hn_api_base(),
        }
    }
}

/// Parses a CSS selector, reporting failures as a plugin error.
pub(crate) fn selector(css: &str) -> Result<Selector, PluginError> {
    Selector::parse(css).map_err(|e| PluginError::Other(format!("invalid selector '{css}': {e}")))
}
