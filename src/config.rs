//! Application configuration.

use std::path::PathBuf;

use anyhow::{Context, Result};
use curator_core::limits::{
    DEFAULT_MAX_CONCURRENCY, DEFAULT_MAX_ITEMS, DEFAULT_MERGE_CAP, DEFAULT_MIN_ITEMS,
    DEFAULT_RETENTION_DAYS,
};
use feed_io::FeedConfig;
use serde::{Deserialize, Serialize};
use worker::PluginConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Days a processed guid is remembered
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    /// In-flight item transforms per enrichment stage
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Items kept in the published feed
    #[serde(default = "default_merge_cap")]
    pub merge_cap: usize,
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    #[serde(default = "default_min_items")]
    pub min_items: usize,
    /// Explicit history file; derived from the feed path when unset
    #[serde(default)]
    pub history_path: Option<PathBuf>,

    #[serde(default)]
    pub feed: FeedConfig,

    #[serde(default)]
    pub plugins: PluginConfig,
}

fn default_retention_days() -> u32 {
    DEFAULT_RETENTION_DAYS
}

fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

fn default_merge_cap() -> usize {
    DEFAULT_MERGE_CAP
}

fn default_max_items() -> usize {
    DEFAULT_MAX_ITEMS
}

fn default_min_items() -> usize {
    DEFAULT_MIN_ITEMS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            retention_days: default_retention_days(),
            max_concurrency: default_max_concurrency(),
            merge_cap: default_merge_cap(),
            max_items: default_max_items(),
            min_items: default_min_items(),
            history_path: None,
            feed: FeedConfig::default(),
            plugins: PluginConfig::default(),
        }
    }
}

/// Loads configuration: defaults, then `config/default.toml`, then
/// `CURATOR_*` environment variables (`__` separates nested keys).
pub fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        .add_source(config::Config::try_from(&Config::default())?)
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("CURATOR")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    config
        .try_deserialize()
        .context("Failed to deserialize configuration")
}
