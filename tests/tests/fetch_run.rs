//! Fetch run tests: provider → history → selection → enrichment → history.

use std::fs;
use std::sync::Arc;

use curator_core::HistoryStore;
use integration_tests::fixtures;
use integration_tests::mocks::{FailOnGuid, UppercaseTitle};
use integration_tests::setup::FetchContext;
use telemetry::metrics;

fn seed_history(ctx: &FetchContext, guids: &[&str]) {
    let mut history = HistoryStore::empty(ctx.history_path());
    history.mark_processed(guids.iter().copied());
    history.persist().expect("seed history");
}

#[tokio::test]
async fn test_reports_new_and_existing_counts() {
    let ctx = FetchContext::new(fixtures::feed_items(5));
    seed_history(&ctx, &["item-0", "item-1"]);

    let report = ctx.run.execute(&ctx.request()).await.unwrap();
    let doc = &report.document;

    assert_eq!(doc.total_items, 5);
    assert_eq!(doc.new_items, 3);
    assert_eq!(doc.existing_items, 2);
    assert_eq!(doc.source_title.as_deref(), Some("Mock Source"));
    assert_eq!(
        doc.items.iter().map(|i| i.guid.as_str()).collect::<Vec<_>>(),
        vec!["item-2", "item-3", "item-4"]
    );

    let history = HistoryStore::load(ctx.history_path());
    assert_eq!(history.len(), 5);
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let ctx = FetchContext::new(fixtures::feed_items(4));

    let first = ctx.run.execute(&ctx.request()).await.unwrap();
    assert_eq!(first.document.new_items, 4);
    let seen_at = HistoryStore::load(ctx.history_path())
        .first_seen("item-0")
        .map(str::to_string);

    let second = ctx.run.execute(&ctx.request()).await.unwrap();
    assert_eq!(second.document.new_items, 0);
    assert_eq!(second.document.existing_items, 4);
    assert!(second.document.items.is_empty());

    let history = HistoryStore::load(ctx.history_path());
    assert_eq!(history.len(), 4);
    assert_eq!(history.first_seen("item-0").map(str::to_string), seen_at);
}

#[tokio::test]
async fn test_backfill_reaches_min_items() {
    let ctx = FetchContext::new(fixtures::feed_items(6));
    seed_history(&ctx, &["item-0", "item-2", "item-4"]);

    let request = curator_request(&ctx, |r| r.min_items = 5);
    let report = ctx.run.execute(&request).await.unwrap();

    let guids: Vec<_> = report.document.items.iter().map(|i| i.guid.as_str()).collect();
    assert_eq!(guids, vec!["item-1", "item-3", "item-5", "item-0", "item-2"]);
    assert_eq!(report.backfilled, 2);
    assert_eq!(report.document.new_items, 5);
}

#[tokio::test]
async fn test_max_items_limits_window() {
    let ctx = FetchContext::new(fixtures::feed_items(30));

    let report = ctx.run.execute(&ctx.request()).await.unwrap();

    assert_eq!(report.document.total_items, 20);
    assert_eq!(report.document.new_items, 20);
    assert!(!HistoryStore::load(ctx.history_path()).is_processed("item-20"));
}

#[tokio::test]
async fn test_source_failure_leaves_history_untouched() {
    let ctx = FetchContext::new(fixtures::feed_items(3));
    ctx.provider.set_should_fail(true);

    let err = ctx.run.execute(&ctx.request()).await.unwrap_err();

    assert_eq!(err.code(), "SOURCE_001");
    assert!(err.is_fatal());
    assert!(!ctx.history_path().exists());
}

#[tokio::test]
async fn test_persist_failure_is_fatal() {
    let ctx = FetchContext::new(fixtures::feed_items(2));
    let blocked = ctx.dir.path().join("state");
    fs::create_dir_all(&blocked).unwrap();

    let request = curator_request(&ctx, |r| r.history_path = Some(blocked.clone()));
    let err = ctx.run.execute(&request).await.unwrap_err();

    assert_eq!(err.code(), "PERSIST_001");
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_corrupt_history_starts_empty() {
    let ctx = FetchContext::new(fixtures::feed_items(2));
    fs::create_dir_all(ctx.history_path().parent().unwrap()).unwrap();
    fs::write(ctx.history_path(), "{ definitely not json").unwrap();

    let report = ctx.run.execute(&ctx.request()).await.unwrap();

    assert_eq!(report.document.new_items, 2);
    assert_eq!(HistoryStore::load(ctx.history_path()).len(), 2);
}

#[tokio::test]
async fn test_expired_entries_are_evicted() {
    let ctx = FetchContext::new(fixtures::feed_items(1));
    fs::create_dir_all(ctx.history_path().parent().unwrap()).unwrap();
    fs::write(
        ctx.history_path(),
        r#"{"guids": {"ancient": "2020-01-01T00:00:00.000Z", "garbled": "yesterday-ish"}, "updated_at": null}"#,
    )
    .unwrap();

    let report = ctx.run.execute(&ctx.request()).await.unwrap();
    assert_eq!(report.evicted, 1);

    let history = HistoryStore::load(ctx.history_path());
    assert!(!history.is_processed("ancient"));
    assert!(history.is_processed("garbled"));
    assert!(history.is_processed("item-0"));
    assert!(history.snapshot().updated_at.is_some());
}

#[tokio::test]
async fn test_enriched_items_marked_even_when_a_transform_fails() {
    let ctx = FetchContext::with_plugins(
        fixtures::feed_items(3),
        vec![Arc::new(UppercaseTitle), Arc::new(FailOnGuid("item-1".into()))],
    );

    let request = curator_request(&ctx, |r| {
        r.plugins = vec!["uppercase".into(), "fail_on_guid".into(), "not_installed".into()]
    });
    let report = ctx.run.execute(&request).await.unwrap();

    let items = &report.document.items;
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].title, "STORY 0");
    assert!(items[0].extra.contains_key("tagged"));
    assert_eq!(items[1].title, "STORY 1");
    assert!(!items[1].extra.contains_key("tagged"));
    assert_eq!(report.pipeline.failed_items(), 1);
    assert_eq!(report.pipeline.skipped().collect::<Vec<_>>(), vec!["not_installed"]);

    let history = HistoryStore::load(ctx.history_path());
    assert!(["item-0", "item-1", "item-2"].iter().all(|g| history.is_processed(g)));
}

#[tokio::test]
async fn test_items_document_written_to_output() {
    let ctx = FetchContext::new(fixtures::feed_items(2));
    let report = ctx.run.execute(&ctx.request()).await.unwrap();

    let out = ctx.dir.path().join("runs/today/items.json");
    report.document.write(&out).unwrap();

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(value["source_name"], "Example");
    assert_eq!(value["source_url"], "mock://example");
    assert_eq!(value["new_items"], 2);
    assert_eq!(value["items"][1]["guid"], "item-1");
}

fn curator_request(
    ctx: &FetchContext,
    edit: impl FnOnce(&mut worker::FetchRequest),
) -> worker::FetchRequest {
    let mut request = ctx.request();
    edit(&mut request);
    request
}

#[tokio::test]
async fn test_run_updates_metrics() {
    let ctx = FetchContext::new(fixtures::feed_items(5));
    let fetched = metrics().items_fetched.get();
    let marked = metrics().history_marked.get();

    ctx.run.execute(&ctx.request()).await.unwrap();

    assert!(metrics().items_fetched.get() >= fetched + 5);
    assert!(metrics().history_marked.get() >= marked + 5);
    assert!(metrics().snapshot().items_selected >= 5);
}
