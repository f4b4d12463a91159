//! Generate run: join classification verdicts onto fetched items and
//! publish the merged feed.

use std::path::PathBuf;

use chrono::Utc;
use curator_core::limits::DEFAULT_MERGE_CAP;
use curator_core::{classify, merge, Result};
use feed_io::{load_existing_items, write_rss, OutputFeed};
use telemetry::metrics;
use tracing::{info, instrument};

use crate::document::{load_classification, ItemsDocument};

/// Inputs for one generate run.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub items_path: PathBuf,
    pub results_path: PathBuf,
    /// Published feed; read for existing items, then overwritten.
    pub output_path: PathBuf,
    pub title: Option<String>,
    pub merge_cap: usize,
}

impl GenerateRequest {
    pub fn new(
        items_path: impl Into<PathBuf>,
        results_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            items_path: items_path.into(),
            results_path: results_path.into(),
            output_path: output_path.into(),
            title: None,
            merge_cap: DEFAULT_MERGE_CAP,
        }
    }
}

/// Result of a generate run.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateReport {
    pub output_path: PathBuf,
    pub source_name: String,
    pub title: String,
    /// New items that made a published tier.
    pub matched: usize,
    /// Items in the written feed.
    pub published: usize,
}

#[derive(Debug, Default)]
pub struct GenerateRun;

impl GenerateRun {
    pub fn new() -> Self {
        Self
    }

    #[instrument(skip_all, fields(output = %request.output_path.display()))]
    pub fn execute(&self, request: &GenerateRequest) -> Result<GenerateReport> {
        let document = ItemsDocument::load(&request.items_path)?;
        let results = load_classification(&request.results_path)?;

        let source_name = non_empty(results.source_name).unwrap_or(document.source_name);
        let source_url = non_empty(results.source_url).unwrap_or(document.source_url);
        let title = request
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .or_else(|| document.source_title.and_then(non_empty))
            .unwrap_or_else(|| format!("{source_name} - Curated"));

        let classified = classify(document.items, &results.results);
        let existing = load_existing_items(&request.output_path);
        let outcome = merge(classified, existing, request.merge_cap);

        metrics().items_matched.inc_by(outcome.matched_count as u64);
        metrics().items_published.inc_by(outcome.items.len() as u64);

        let published = outcome.items.len();
        let feed = OutputFeed {
            title: title.clone(),
            link: source_url,
            description: format!("{source_name} items selected by personal interest"),
            last_build_date: Utc::now(),
            items: outcome.items,
        };
        write_rss(&request.output_path, &feed)?;

        info!(
            source = %source_name,
            matched = outcome.matched_count,
            published = published,
            "Generate run complete"
        );

        Ok(GenerateReport {
            output_path: request.output_path.clone(),
            source_name,
            title,
            matched: outcome.matched_count,
            published,
        })
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
