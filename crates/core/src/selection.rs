//! Choosing which fetched items a run hands to enrichment.

use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use crate::history::HistoryStore;
use crate::item::FeedItem;

/// Items chosen for this run, with the counts reported downstream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub items: Vec<FeedItem>,
    /// Items considered after the `max_items` cut.
    pub total_items: usize,
    /// Items re-admitted from history to reach `min_items`.
    pub backfilled: usize,
}

impl Selection {
    pub fn new_items(&self) -> usize {
        self.items.len()
    }

    pub fn existing_items(&self) -> usize {
        self.total_items.saturating_sub(self.items.len())
    }
}

/// Selects unseen items from the head of `fetched`.
///
/// Only the first `max_items` entries are considered. Unseen items are kept
/// in feed order (first occurrence wins for repeated guids). When fewer than
/// `min_items` are unseen, already-processed items from the same window are
/// re-admitted in feed order until the minimum is met or the window runs out.
pub fn select_items(
    fetched: &[FeedItem],
    history: &HistoryStore,
    max_items: usize,
    min_items: usize,
) -> Selection {
    let window = &fetched[..fetched.len().min(max_items)];
    let mut chosen: HashSet<&str> = HashSet::new();
    let mut items = Vec::new();

    for item in window {
        if !history.is_processed(&item.guid) && chosen.insert(item.guid.as_str()) {
            items.push(item.clone());
        }
    }

    let unseen = items.len();
    for item in window {
        if items.len() >= min_items {
            break;
        }
        if chosen.insert(item.guid.as_str()) {
            items.push(item.clone());
        }
    }
    let backfilled = items.len() - unseen;

    debug!(
        window = window.len(),
        unseen = unseen,
        backfilled = backfilled,
        "Selected items"
    );

    Selection {
        items,
        total_items: window.len(),
        backfilled,
    }
}
