//! Built-in plugins and the HTTP feed provider against a local mock site.

use std::sync::Arc;

use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use curator_core::FeedItem;
use feed_io::{FeedConfig, FeedProvider, HttpFeedProvider};
use integration_tests::fixtures;
use integration_tests::setup::MockSite;
use serde_json::{json, Value};
use worker::{EnrichmentPipeline, PluginConfig, PluginRegistry};

async fn hn_item(Path(id): Path<String>) -> Result<Json<Value>, StatusCode> {
    if id != "42" {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(json!({
        "id": 42,
        "children": [
            {"author": "pg", "text": "<p>First</p>", "points": 5, "children": [
                {"author": "dang", "text": "Reply", "points": null, "children": []}
            ]},
            {"author": "ghost", "text": "", "children": []}
        ]
    })))
}

async fn mock_site() -> MockSite {
    let rss = fixtures::rss_document("Mock News", &fixtures::feed_items(3));

    let router = Router::new()
        .route("/article", get(|| async { Html(fixtures::article_page("Rust 2024")) }))
        .route(
            "/cnbeta",
            get(|| async {
                Html(
                    r#"<html><body>
<div class="article-summary"><span class="topic">Tech</span><p>Lead.</p></div>
<div class="article-content"><p>Full story.</p></div>
</body></html>"#,
                )
            }),
        )
        .route("/gone", get(|| async { StatusCode::NOT_FOUND }))
        .route("/rss", get(move || async move { rss }))
        .route("/broken-rss", get(|| async { "<rss><channel><item>" }))
        .route("/down", get(|| async { StatusCode::SERVICE_UNAVAILABLE }))
        .route("/items/:id", get(hn_item));

    MockSite::start(router).await
}

fn registry(site: &MockSite) -> Arc<PluginRegistry> {
    let config = PluginConfig {
        timeout_secs: 5,
        hn_api_base: site.url(""),
        ..PluginConfig::default()
    };
    Arc::new(PluginRegistry::with_builtin_plugins(&config).unwrap())
}

fn item_at(site: &MockSite, path: &str) -> FeedItem {
    FeedItem::new("Story", site.url(path))
}

#[tokio::test]
async fn test_fetch_content_and_meta() {
    let site = mock_site().await;
    let pipeline = EnrichmentPipeline::new(registry(&site));

    let output = pipeline
        .run(vec![item_at(&site, "/article")], &["fetch_content", "fetch_meta"])
        .await;

    let extra = &output[0].extra;
    assert_eq!(
        extra.get("content"),
        Some(&json!("Rust 2024Paragraph text.[IMAGE_0]"))
    );
    assert_eq!(
        extra.get("images"),
        Some(&json!([{"src": "https://cdn.example.com/pic.png", "alt": "pic"}]))
    );
    assert_eq!(extra.get("meta"), Some(&json!("An article about Rust 2024")));
}

#[tokio::test]
async fn test_fetch_failure_sets_empty_values() {
    let site = mock_site().await;
    let pipeline = EnrichmentPipeline::new(registry(&site));

    let (output, report) = pipeline
        .run_with_report(vec![item_at(&site, "/gone")], &["fetch_content", "fetch_meta"])
        .await;

    let extra = &output[0].extra;
    assert_eq!(extra.get("content"), Some(&json!("")));
    assert_eq!(extra.get("images"), Some(&json!([])));
    assert_eq!(extra.get("meta"), Some(&json!("")));
    assert_eq!(report.failed_items(), 0);
}

#[tokio::test]
async fn test_cnbeta_replaces_description() {
    let site = mock_site().await;
    let pipeline = EnrichmentPipeline::new(registry(&site));

    let item = item_at(&site, "/cnbeta").with_description("teaser");
    let output = pipeline.run(vec![item], &["cnbeta_fetch_content"]).await;

    assert_eq!(output[0].description, "<p>Lead.</p><p>Full story.</p>");
}

#[tokio::test]
async fn test_cnbeta_failure_keeps_description() {
    let site = mock_site().await;
    let pipeline = EnrichmentPipeline::new(registry(&site));

    let item = item_at(&site, "/gone").with_description("teaser");
    let (output, report) = pipeline
        .run_with_report(vec![item], &["cnbeta_fetch_content"])
        .await;

    assert_eq!(output[0].description, "teaser");
    assert_eq!(report.failed_items(), 1);
}

#[tokio::test]
async fn test_hn_comments() {
    let site = mock_site().await;
    let pipeline = EnrichmentPipeline::new(registry(&site));

    let hn = FeedItem::new("Show HN", "https://example.com/project")
        .with_guid("https://news.ycombinator.com/item?id=42");
    let missing = FeedItem::new("Ask HN", "https://example.com/ask")
        .with_guid("https://news.ycombinator.com/item?id=7");
    let other = FeedItem::new("Elsewhere", "https://example.com/x");

    let output = pipeline
        .run(vec![hn, missing, other], &["hn_fetch_comments"])
        .await;

    assert_eq!(
        output[0].extra.get("comments"),
        Some(&json!([
            {"author": "pg", "text": "<p>First</p>", "points": 5, "depth": 0},
            {"author": "dang", "text": "Reply", "points": 0, "depth": 1}
        ]))
    );
    assert_eq!(output[1].extra.get("comments"), Some(&json!([])));
    assert!(output[2].extra.is_empty());
}

#[tokio::test]
async fn test_http_provider_parses_feed() {
    let site = mock_site().await;
    let provider = HttpFeedProvider::new(&FeedConfig::default()).unwrap();

    let feed = provider.fetch(&site.url("/rss")).await.unwrap();

    assert_eq!(feed.title.as_deref(), Some("Mock News"));
    assert_eq!(feed.items, fixtures::feed_items(3)
        .into_iter()
        .map(|item| item.with_pub_date(""))
        .collect::<Vec<_>>());
}

#[tokio::test]
async fn test_http_provider_errors() {
    let site = mock_site().await;
    let provider = HttpFeedProvider::new(&FeedConfig::default()).unwrap();

    let err = provider.fetch(&site.url("/down")).await.unwrap_err();
    assert_eq!(err.code(), "SOURCE_001");
    assert!(err.to_string().contains("503"));

    let err = provider.fetch(&site.url("/broken-rss")).await.unwrap_err();
    assert_eq!(err.code(), "FEED_001");
}
