//! Item enrichment through named plugin stages.
//!
//! Stages run strictly in order over the whole batch. Within a stage the
//! per-item transforms run concurrently up to `max_concurrency`, and the
//! results are collected positionally:
//! - output length and order always equal the input's
//! - an item whose transform errors, panics or breaks the plugin contract
//!   is replaced by its pre-stage value
//! - an unknown stage name is skipped

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use curator_core::limits::DEFAULT_MAX_CONCURRENCY;
use curator_core::{Error, FeedItem};
use futures::{stream, FutureExt, StreamExt};
use serde::Serialize;
use telemetry::metrics;
use tracing::{debug, info, warn};

use crate::plugin::Plugin;
use crate::registry::PluginRegistry;

/// What happened to one requested stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageReport {
    Applied {
        name: String,
        succeeded: usize,
        failed: usize,
    },
    Skipped {
        name: String,
    },
}

impl StageReport {
    pub fn name(&self) -> &str {
        match self {
            Self::Applied { name, .. } | Self::Skipped { name } => name,
        }
    }
}

/// Per-stage outcome of a pipeline run, in stage order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    pub stages: Vec<StageReport>,
}

impl PipelineReport {
    /// Item transforms reverted across all stages.
    pub fn failed_items(&self) -> usize {
        self.stages
            .iter()
            .map(|stage| match stage {
                StageReport::Applied { failed, .. } => *failed,
                StageReport::Skipped { .. } => 0,
            })
            .sum()
    }

    pub fn skipped(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().filter_map(|stage| match stage {
            StageReport::Skipped { name } => Some(name.as_str()),
            StageReport::Applied { .. } => None,
        })
    }
}

enum ItemOutcome {
    Transformed(FeedItem),
    Reverted(FeedItem),
}

/// Applies plugin stages to a batch of items.
#[derive(Clone)]
pub struct EnrichmentPipeline {
    registry: Arc<PluginRegistry>,
    max_concurrency: usize,
}

impl EnrichmentPipeline {
    pub fn new(registry: Arc<PluginRegistry>) -> Self {
        Self {
            registry,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// Caps in-flight transforms per stage. Zero is treated as one.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Runs `stages` over `items` and returns the enriched items.
    pub async fn run<S: AsRef<str>>(&self, items: Vec<FeedItem>, stages: &[S]) -> Vec<FeedItem> {
        self.run_with_report(items, stages).await.0
    }

    /// Like [`run`](Self::run), also reporting what each stage did.
    pub async fn run_with_report<S: AsRef<str>>(
        &self,
        mut items: Vec<FeedItem>,
        stages: &[S],
    ) -> (Vec<FeedItem>, PipelineReport) {
        let mut report = PipelineReport::default();

        for name in stages.iter().map(|s| s.as_ref().trim()).filter(|s| !s.is_empty()) {
            let plugin = match self.registry.resolve(name) {
                Ok(plugin) => plugin,
                Err(e) => {
                    warn!(stage = name, code = e.code(), error = %e, "Skipping stage");
                    metrics().stages_skipped.inc();
                    report.stages.push(StageReport::Skipped {
                        name: name.to_string(),
                    });
                    continue;
                }
            };

            let (next, succeeded, failed) = self.apply_stage(name, plugin, items).await;
            items = next;

            info!(stage = name, succeeded = succeeded, failed = failed, "Applied stage");
            metrics().stages_applied.inc();
            report.stages.push(StageReport::Applied {
                name: name.to_string(),
                succeeded,
                failed,
            });
        }

        (items, report)
    }

    async fn apply_stage(
        &self,
        stage: &str,
        plugin: Arc<dyn Plugin>,
        items: Vec<FeedItem>,
    ) -> (Vec<FeedItem>, usize, usize) {
        let outcomes: Vec<ItemOutcome> = stream::iter(items.into_iter().enumerate())
            .map(|(index, item)| transform(stage, Arc::clone(&plugin), index, item))
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let mut failed = 0;
        let items = outcomes
            .into_iter()
            .map(|outcome| match outcome {
                ItemOutcome::Transformed(item) => item,
                ItemOutcome::Reverted(item) => {
                    failed += 1;
                    item
                }
            })
            .collect::<Vec<_>>();

        let succeeded = items.len() - failed;
        (items, succeeded, failed)
    }
}

async fn transform(
    stage: &str,
    plugin: Arc<dyn Plugin>,
    index: usize,
    item: FeedItem,
) -> ItemOutcome {
    let original = item.clone();
    let started = Instant::now();

    let result = AssertUnwindSafe(plugin.process_item(item)).catch_unwind().await;
    metrics()
        .item_transform_latency_ms
        .observe(started.elapsed().as_millis() as u64);

    let failure = match result {
        Ok(Ok(output)) => match contract_violation(&original, &output) {
            None => {
                debug!(stage = stage, index = index, guid = %output.guid, "Item transformed");
                metrics().item_transforms_ok.inc();
                return ItemOutcome::Transformed(output);
            }
            Some(violation) => violation,
        },
        Ok(Err(e)) => e.to_string(),
        Err(panic) => format!("plugin panicked: {}", panic_message(panic.as_ref())),
    };

    let err = Error::item_failed(stage, index, failure);
    warn!(
        stage = stage,
        index = index,
        guid = %original.guid,
        code = err.code(),
        error = %err,
        "Item transform failed, keeping original"
    );
    metrics().item_transforms_failed.inc();
    ItemOutcome::Reverted(original)
}

/// Plugins may add `extra` keys and rewrite content, never re-identify the
/// item or drop earlier enrichment.
fn contract_violation(before: &FeedItem, after: &FeedItem) -> Option<String> {
    if before.guid != after.guid {
        return Some(format!("guid changed from '{}' to '{}'", before.guid, after.guid));
    }

    let missing = after.extra.missing_keys(&before.extra);
    if !missing.is_empty() {
        return Some(format!("extra keys removed: {}", missing.join(", ")));
    }

    None
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic payload"
    }
}
