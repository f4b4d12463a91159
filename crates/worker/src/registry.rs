//! Static plugin registry.

use std::collections::HashMap;
use std::sync::Arc;

use curator_core::{Error, Result};
use tracing::debug;

use crate::plugin::{Plugin, PluginError};
use crate::plugins::{
    build_client, CnbetaFetchContent, FetchContent, FetchMeta, HnFetchComments, PluginConfig,
    ZaihuapdCleanDescription,
};

/// Maps stage names to plugins. Built once at startup.
#[derive(Default, Clone)]
pub struct PluginRegistry {
    plugins: HashMap<String, Arc<dyn Plugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in plugin, sharing one HTTP client.
    pub fn with_builtin_plugins(config: &PluginConfig) -> std::result::Result<Self, PluginError> {
        let client = build_client(config)?;

        let mut registry = Self::new();
        registry.register(Arc::new(FetchContent::new(client.clone(), config.max_content_chars)));
        registry.register(Arc::new(FetchMeta::new(client.clone())));
        registry.register(Arc::new(CnbetaFetchContent::new(client.clone())));
        registry.register(Arc::new(HnFetchComments::new(client, config.hn_api_base.clone())));
        registry.register(Arc::new(ZaihuapdCleanDescription));
        Ok(registry)
    }

    /// Registers `plugin` under its own name, replacing any previous one.
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) {
        debug!(plugin = plugin.name(), "Registered plugin");
        self.plugins.insert(plugin.name().to_string(), plugin);
    }

    /// Looks up the plugin for a stage name.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Plugin>> {
        self.plugins
            .get(name)
            .cloned()
            .ok_or_else(|| Error::StageUnresolved(name.to_string()))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.plugins.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
