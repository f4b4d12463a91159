//! Enrichment and run orchestration for the feed curator.
//!
//! - Plugins (named per-item transforms) and their static registry
//! - Enrichment pipeline (ordered stages, bounded concurrency)
//! - Fetch run (source → dedup → enrich → history)
//! - Generate run (classification join → merge → RSS)

pub mod document;
pub mod enrichment;
pub mod fetch;
pub mod generate;
pub mod plugin;
pub mod plugins;
pub mod registry;

pub use document::{load_classification, ItemsDocument};
pub use enrichment::{EnrichmentPipeline, PipelineReport, StageReport};
pub use fetch::{FetchReport, FetchRequest, FetchRun};
pub use generate::{GenerateReport, GenerateRequest, GenerateRun};
pub use plugin::{Plugin, PluginError};
pub use plugins::PluginConfig;
pub use registry::PluginRegistry;
