//! Common test setup functions.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use curator_core::FeedItem;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use worker::{EnrichmentPipeline, FetchRequest, FetchRun, Plugin, PluginRegistry};

use crate::mocks::MockFeedProvider;

/// An axum app served on an ephemeral local port, standing in for remote
/// sites and APIs.
pub struct MockSite {
    pub addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl MockSite {
    pub async fn start(router: Router) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock site");
        let addr = listener.local_addr().expect("mock site address");

        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });

        Self { addr, handle }
    }

    /// Absolute URL for `path` on this site.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for MockSite {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A fetch run against a mock provider with its state in a temp dir.
pub struct FetchContext {
    pub dir: TempDir,
    pub provider: MockFeedProvider,
    pub run: FetchRun,
}

impl FetchContext {
    pub fn new(items: Vec<FeedItem>) -> Self {
        Self::with_plugins(items, Vec::new())
    }

    pub fn with_plugins(items: Vec<FeedItem>, plugins: Vec<Arc<dyn Plugin>>) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let provider = MockFeedProvider::new(items);

        let mut registry = PluginRegistry::new();
        for plugin in plugins {
            registry.register(plugin);
        }
        let pipeline = EnrichmentPipeline::new(Arc::new(registry)).with_max_concurrency(4);
        let run = FetchRun::new(Arc::new(provider.clone()), pipeline);

        Self { dir, provider, run }
    }

    /// Published feed path inside the temp dir.
    pub fn feed_path(&self) -> PathBuf {
        self.dir.path().join("output").join("example.xml")
    }

    pub fn history_path(&self) -> PathBuf {
        self.dir.path().join("output").join("example-processed.json")
    }

    pub fn request(&self) -> FetchRequest {
        FetchRequest::new("mock://example", self.feed_path(), "Example")
    }
}
