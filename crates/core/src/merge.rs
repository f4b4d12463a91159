//! Folding classified items into the published feed.
//!
//! The published feed is a rolling window: newly published items always take
//! the top positions, and once the cap is exceeded the oldest existing
//! entries fall off the end.

use tracing::debug;

use crate::classification::ClassifiedItem;
use crate::item::FeedItem;

/// Result of a merge.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    /// New items first, then existing ones, at most `cap` in total.
    pub items: Vec<FeedItem>,
    /// Classified items that qualified for publication, before truncation.
    pub matched_count: usize,
}

/// Merges classified items ahead of `existing` and truncates to `cap`.
pub fn merge(classified: Vec<ClassifiedItem>, existing: Vec<FeedItem>, cap: usize) -> MergeOutcome {
    let fresh: Vec<FeedItem> = classified
        .into_iter()
        .filter(|c| c.kind.is_published())
        .map(decorate)
        .collect();
    let matched_count = fresh.len();

    let mut items = fresh;
    items.extend(existing);
    let dropped = items.len().saturating_sub(cap);
    items.truncate(cap);

    debug!(matched = matched_count, total = items.len(), dropped = dropped, "Merged feed");
    MergeOutcome {
        items,
        matched_count,
    }
}

/// Applies the tier marker to the title and the rationale to the description.
pub fn decorate(classified: ClassifiedItem) -> FeedItem {
    let ClassifiedItem { mut item, kind, reason } = classified;

    if let Some(marker) = kind.title_marker() {
        item.title = format!("{marker} {}", item.title);
    }
    item.description = format!(
        "{}<p><small>[{}] {}</small></p>",
        item.description, kind, reason
    );
    item
}
