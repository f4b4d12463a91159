//! Defaults and bounds for a curation run.
//!
//! Every value here can be overridden through configuration or CLI flags;
//! these are the values a run uses when nothing else is set.

// === History ===

/// Days a seen guid stays in history before it may be evicted.
pub const DEFAULT_RETENTION_DAYS: u32 = 4;

// === Selection ===

/// Items taken from the head of the fetched feed.
pub const DEFAULT_MAX_ITEMS: usize = 20;

/// Minimum items handed to enrichment (0 disables backfill).
pub const DEFAULT_MIN_ITEMS: usize = 0;

// === Enrichment ===

/// Item transforms in flight at once within a stage.
pub const DEFAULT_MAX_CONCURRENCY: usize = 10;

/// Per-request timeout used by the bundled HTTP plugins (seconds).
pub const DEFAULT_PLUGIN_TIMEOUT_SECS: u64 = 10;

/// Extracted page text is truncated to this many characters.
pub const DEFAULT_MAX_CONTENT_CHARS: usize = 15_000;

// === Output ===

/// Maximum items kept in the published feed.
pub const DEFAULT_MERGE_CAP: usize = 50;

// === Source fetch ===

/// Feed source request timeout (seconds).
pub const DEFAULT_FEED_TIMEOUT_SECS: u64 = 10;

/// User agent sent when polling sources.
pub const DEFAULT_FEED_USER_AGENT: &str = "Mozilla/5.0 (compatible; RSS Reader/1.0)";

/// User agent sent by the page-fetching plugins.
pub const DEFAULT_PLUGIN_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";
