//! The items document handed from a fetch run to classification and on to
//! a generate run.

use std::fs;
use std::path::Path;

use curator_core::{ClassificationFile, Error, FeedItem, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemsDocument {
    pub source_name: String,
    pub source_url: String,
    pub source_title: Option<String>,
    /// Items considered after the `max_items` cut.
    pub total_items: usize,
    pub existing_items: usize,
    pub new_items: usize,
    pub items: Vec<FeedItem>,
}

impl ItemsDocument {
    /// Reads a document written by a fetch run.
    pub fn load(path: &Path) -> Result<Self> {
        read_json(path)
    }

    /// Writes the document as pretty JSON, creating parent directories.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        info!(path = %path.display(), items = self.items.len(), "Wrote items document");
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Reads the classification results for a generate run.
pub fn load_classification(path: &Path) -> Result<ClassificationFile> {
    read_json(path)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| Error::invalid_input(path, e.to_string()))?;
    serde_json::from_str(&content).map_err(|e| Error::invalid_input(path, e.to_string()))
}
