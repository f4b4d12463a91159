//! Fetch run: poll a source, keep the unseen items, enrich them and record
//! them in the dedup history.

use std::path::PathBuf;
use std::sync::Arc;

use curator_core::limits::{DEFAULT_MAX_ITEMS, DEFAULT_MIN_ITEMS, DEFAULT_RETENTION_DAYS};
use curator_core::{history_path_for, select_items, HistoryStore, Result};
use feed_io::FeedProvider;
use telemetry::metrics;
use tracing::{info, instrument};

use crate::document::ItemsDocument;
use crate::enrichment::{EnrichmentPipeline, PipelineReport};

/// Inputs for one fetch run.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    /// Path of the published feed; the history file sits next to it.
    pub existing_feed: PathBuf,
    pub source_name: String,
    pub max_items: usize,
    pub min_items: usize,
    pub plugins: Vec<String>,
    /// Overrides the history path derived from `existing_feed`.
    pub history_path: Option<PathBuf>,
    pub retention_days: u32,
}

impl FetchRequest {
    pub fn new(
        url: impl Into<String>,
        existing_feed: impl Into<PathBuf>,
        source_name: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            existing_feed: existing_feed.into(),
            source_name: source_name.into(),
            max_items: DEFAULT_MAX_ITEMS,
            min_items: DEFAULT_MIN_ITEMS,
            plugins: Vec::new(),
            history_path: None,
            retention_days: DEFAULT_RETENTION_DAYS,
        }
    }

    pub fn history_path(&self) -> PathBuf {
        self.history_path
            .clone()
            .unwrap_or_else(|| history_path_for(&self.existing_feed))
    }
}

/// Result of a fetch run.
#[derive(Debug, Clone)]
pub struct FetchReport {
    pub document: ItemsDocument,
    pub backfilled: usize,
    pub evicted: usize,
    pub pipeline: PipelineReport,
}

pub struct FetchRun {
    provider: Arc<dyn FeedProvider>,
    pipeline: EnrichmentPipeline,
}

impl FetchRun {
    pub fn new(provider: Arc<dyn FeedProvider>, pipeline: EnrichmentPipeline) -> Self {
        Self { provider, pipeline }
    }

    /// Executes the run.
    ///
    /// Fails only when the source cannot be fetched or the history cannot
    /// be written; in the first case the history is left untouched.
    #[instrument(skip_all, fields(source = %request.source_name, url = %request.url))]
    pub async fn execute(&self, request: &FetchRequest) -> Result<FetchReport> {
        let feed = self.provider.fetch(&request.url).await?;
        metrics().items_fetched.inc_by(feed.items.len() as u64);

        let mut history = HistoryStore::load(request.history_path());

        let selection = select_items(&feed.items, &history, request.max_items, request.min_items);
        metrics().items_selected.inc_by(selection.new_items() as u64);
        metrics().items_backfilled.inc_by(selection.backfilled as u64);
        info!(
            fetched = feed.items.len(),
            total = selection.total_items,
            selected = selection.new_items(),
            backfilled = selection.backfilled,
            "Selected items"
        );

        let total_items = selection.total_items;
        let existing_items = selection.existing_items();
        let backfilled = selection.backfilled;

        let (items, pipeline) = self
            .pipeline
            .run_with_report(selection.items, &request.plugins)
            .await;

        let marked = history.mark_processed(items.iter().map(|item| item.guid.clone()));
        let evicted = history.cleanup(request.retention_days);
        metrics().history_marked.inc_by(marked as u64);
        metrics().history_evicted.inc_by(evicted as u64);
        history.persist()?;

        info!(
            new = items.len(),
            marked = marked,
            evicted = evicted,
            tracked = history.len(),
            "Fetch run complete"
        );

        Ok(FetchReport {
            document: ItemsDocument {
                source_name: request.source_name.clone(),
                source_url: request.url.clone(),
                source_title: feed.title,
                total_items,
                existing_items,
                new_items: items.len(),
                items,
            },
            backfilled,
            evicted,
            pipeline,
        })
    }
}
