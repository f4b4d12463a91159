//! Normalized feed items.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A normalized item from a feed source.
///
/// Identity is `guid`; two items are the same item iff their guids are equal.
/// Items are built per run and never persisted themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    /// Publication date exactly as the source wrote it.
    #[serde(rename = "pubDate", default)]
    pub pub_date: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub guid: String,
    /// Fields contributed by enrichment plugins.
    #[serde(default, skip_serializing_if = "Extra::is_empty")]
    pub extra: Extra,
}

impl FeedItem {
    /// Creates an item whose guid defaults to its link.
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        let link = link.into();
        Self {
            title: title.into(),
            guid: link.clone(),
            link,
            pub_date: String::new(),
            description: String::new(),
            extra: Extra::default(),
        }
    }

    /// Sets an explicit guid. Empty guids keep the link fallback.
    pub fn with_guid(mut self, guid: impl Into<String>) -> Self {
        let guid = guid.into();
        if !guid.is_empty() {
            self.guid = guid;
        }
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_pub_date(mut self, pub_date: impl Into<String>) -> Self {
        self.pub_date = pub_date.into();
        self
    }
}

/// Open key-value area filled by enrichment plugins.
///
/// Keys can be added or overwritten but never removed, so a later stage can
/// rely on what an earlier stage contributed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Extra(BTreeMap<String, Value>);

impl Extra {
    /// Inserts or overwrites a field.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the keys of `earlier` missing from `self`.
    pub fn missing_keys<'a>(&self, earlier: &'a Extra) -> Vec<&'a str> {
        earlier.keys().filter(|k| !self.contains_key(k)).collect()
    }
}
