//! Feed Curator
//!
//! Turns noisy upstream feeds into a curated rolling RSS window:
//! - `fetch` polls a source, drops items already seen, runs enrichment
//!   plugins and emits the new items as JSON
//! - `generate` joins external classification verdicts onto those items and
//!   merges the interesting ones into the published feed

mod config;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};

use crate::config::{load_config, Config};
use feed_io::HttpFeedProvider;
use telemetry::{init_tracing_from_env, metrics};
use worker::{
    EnrichmentPipeline, FetchRequest, FetchRun, GenerateRequest, GenerateRun, PluginRegistry,
};

#[derive(Debug, Parser)]
#[command(name = "feed-curator", version, about = "Curate RSS feeds into a rolling window")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch a source and emit its unseen items as JSON
    Fetch(FetchArgs),
    /// Merge classified items into the published feed
    Generate(GenerateArgs),
}

#[derive(Debug, Args)]
struct FetchArgs {
    /// Feed URL to poll
    url: String,
    /// Published feed; its dedup history lives next to it
    existing_feed: PathBuf,
    #[arg(long)]
    source_name: String,
    /// Only the first N items of the source are considered
    #[arg(long)]
    max_items: Option<usize>,
    /// Re-admit already seen items until at least N are emitted
    #[arg(long)]
    min_items: Option<usize>,
    /// Write the items document here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
    /// Comma-separated enrichment stages, applied in order
    #[arg(long, value_delimiter = ',')]
    plugins: Vec<String>,
}

#[derive(Debug, Args)]
struct GenerateArgs {
    /// Items document written by `fetch`
    items: PathBuf,
    /// Classification results keyed by guid
    results: PathBuf,
    /// Feed to merge into and overwrite
    output: PathBuf,
    /// Channel title; defaults to the source title
    #[arg(long)]
    title: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing_from_env();

    let result = match load_config() {
        Ok(config) => run(cli.command, &config).await,
        Err(e) => Err(e),
    };
    metrics().log_summary();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Fetch(args) => fetch(args, config).await,
        Command::Generate(args) => generate(args, config),
    }
}

async fn fetch(args: FetchArgs, config: &Config) -> Result<()> {
    let provider =
        Arc::new(HttpFeedProvider::new(&config.feed).context("Failed to create feed provider")?);
    let registry = PluginRegistry::with_builtin_plugins(&config.plugins)
        .context("Failed to create plugin registry")?;
    let pipeline =
        EnrichmentPipeline::new(Arc::new(registry)).with_max_concurrency(config.max_concurrency);

    let request = FetchRequest {
        max_items: args.max_items.unwrap_or(config.max_items),
        min_items: args.min_items.unwrap_or(config.min_items),
        plugins: args.plugins,
        history_path: config.history_path.clone(),
        retention_days: config.retention_days,
        ..FetchRequest::new(args.url, args.existing_feed, args.source_name)
    };

    let report = FetchRun::new(provider, pipeline)
        .execute(&request)
        .await
        .context("Fetch run failed")?;

    match args.output {
        Some(path) => report
            .document
            .write(&path)
            .with_context(|| format!("Failed to write items to {}", path.display()))?,
        None => println!("{}", report.document.to_json()?),
    }

    info!(
        new = report.document.new_items,
        existing = report.document.existing_items,
        failed_transforms = report.pipeline.failed_items(),
        "Fetch finished"
    );
    Ok(())
}

fn generate(args: GenerateArgs, config: &Config) -> Result<()> {
    let request = GenerateRequest {
        title: args.title,
        merge_cap: config.merge_cap,
        ..GenerateRequest::new(args.items, args.results, args.output)
    };

    let report = GenerateRun::new()
        .execute(&request)
        .context("Generate run failed")?;

    println!("RSS generated: {}", report.output_path.display());
    println!("- source: {}", report.source_name);
    println!("- new items: {}", report.matched);
    Ok(())
}
