//! Classification results produced outside the curator.
//!
//! An external system scores each new item and writes one result per guid.
//! The curator only consumes those results: it joins them back onto the
//! fetched items and hands the classified items to the merger.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::item::FeedItem;

/// Reason attached to items that have no classification result.
pub const MISSING_RESULT_REASON: &str = "no classification result";

/// Classification tier for one item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationType {
    HighInterest,
    Interest,
    Other,
    Uninterested,
    /// Also read from the legacy `excluded` spelling, from any unknown tier,
    /// and from results that carry no tier at all.
    #[default]
    #[serde(other)]
    Exclude,
}

impl ClassificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HighInterest => "high_interest",
            Self::Interest => "interest",
            Self::Other => "other",
            Self::Uninterested => "uninterested",
            Self::Exclude => "exclude",
        }
    }

    /// Whether items of this tier are published.
    pub fn is_published(&self) -> bool {
        matches!(self, Self::HighInterest | Self::Interest | Self::Other)
    }

    /// Title marker distinguishing the two interest tiers.
    pub fn title_marker(&self) -> Option<&'static str> {
        match self {
            Self::HighInterest => Some("⭐⭐"),
            Self::Interest => Some("⭐"),
            _ => None,
        }
    }
}

impl std::fmt::Display for ClassificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict for a single guid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    #[serde(rename = "type", default)]
    pub kind: ClassificationType,
    #[serde(default)]
    pub reason: String,
    /// Replacement title; empty means keep the fetched one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Replacement description; empty means keep the fetched one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The classification file for one source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationFile {
    #[serde(default)]
    pub source_name: String,
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub results: HashMap<String, ClassificationResult>,
}

/// A fetched item joined with its verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedItem {
    pub item: FeedItem,
    pub kind: ClassificationType,
    pub reason: String,
}

/// Joins results onto items by guid, preserving item order.
///
/// Items without a result are classified as `exclude`.
pub fn classify(items: Vec<FeedItem>, results: &HashMap<String, ClassificationResult>) -> Vec<ClassifiedItem> {
    items
        .into_iter()
        .map(|mut item| match results.get(&item.guid) {
            Some(result) => {
                if let Some(title) = non_empty(&result.title) {
                    item.title = title.to_string();
                }
                if let Some(description) = non_empty(&result.description) {
                    item.description = description.to_string();
                }
                ClassifiedItem {
                    item,
                    kind: result.kind,
                    reason: result.reason.clone(),
                }
            }
            None => ClassifiedItem {
                item,
                kind: ClassificationType::Exclude,
                reason: MISSING_RESULT_REASON.to_string(),
            },
        })
        .collect()
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
