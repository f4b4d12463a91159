//! Feed source configuration.

use curator_core::limits::{DEFAULT_FEED_TIMEOUT_SECS, DEFAULT_FEED_USER_AGENT};
use serde::{Deserialize, Serialize};

/// Settings for polling feed sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// User agent sent to sources
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_user_agent() -> String {
    DEFAULT_FEED_USER_AGENT.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_FEED_TIMEOUT_SECS
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}
