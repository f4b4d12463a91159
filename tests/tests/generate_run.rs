//! Generate run tests: items document + verdicts + existing feed → RSS.

use std::fs;
use std::path::{Path, PathBuf};

use curator_core::{ClassificationFile, ClassificationType, FeedItem};
use feed_io::parse_rss;
use integration_tests::fixtures::{self, verdict};
use tempfile::TempDir;
use worker::{GenerateRequest, GenerateRun, ItemsDocument};

struct Inputs {
    dir: TempDir,
    items: PathBuf,
    results: PathBuf,
    output: PathBuf,
}

fn inputs(document: &ItemsDocument, results: &ClassificationFile) -> Inputs {
    let dir = tempfile::tempdir().unwrap();
    let items = dir.path().join("items.json");
    let results_path = dir.path().join("results.json");
    let output = dir.path().join("output/example.xml");

    document.write(&items).unwrap();
    fs::write(&results_path, serde_json::to_string(results).unwrap()).unwrap();

    Inputs {
        dir,
        items,
        results: results_path,
        output,
    }
}

fn request(inputs: &Inputs) -> GenerateRequest {
    GenerateRequest::new(&inputs.items, &inputs.results, &inputs.output)
}

fn published(path: &Path) -> Vec<FeedItem> {
    parse_rss(&fs::read_to_string(path).unwrap()).unwrap().items
}

#[test]
fn test_item_without_verdict_is_excluded() {
    let mut items = fixtures::prefixed_items("x", 1);
    items.extend(fixtures::prefixed_items("y", 1));
    let document = fixtures::items_document(items);
    let results = fixtures::classification([("y-0", verdict(ClassificationType::Interest, "rust"))]);
    let inputs = inputs(&document, &results);

    let report = GenerateRun::new().execute(&request(&inputs)).unwrap();

    assert_eq!(report.matched, 1);
    assert_eq!(report.published, 1);
    let items = published(&inputs.output);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].guid, "y-0");
    assert_eq!(items[0].title, "⭐ y 0");
    assert!(items[0].description.ends_with("<p><small>[interest] rust</small></p>"));
}

#[test]
fn test_new_items_lead_and_cap_applies() {
    let document = fixtures::items_document(fixtures::prefixed_items("new", 5));
    let results = fixtures::classification(
        ["new-0", "new-1", "new-2", "new-3", "new-4"]
            .map(|guid| (guid, verdict(ClassificationType::Other, "misc"))),
    );
    let inputs = inputs(&document, &results);
    fixtures::write_existing_feed(&inputs.output, fixtures::prefixed_items("old", 48));

    let report = GenerateRun::new().execute(&request(&inputs)).unwrap();

    assert_eq!(report.matched, 5);
    assert_eq!(report.published, 50);

    let guids: Vec<String> = published(&inputs.output).into_iter().map(|i| i.guid).collect();
    let expected: Vec<String> = (0..5)
        .map(|i| format!("new-{i}"))
        .chain((0..45).map(|i| format!("old-{i}")))
        .collect();
    assert_eq!(guids, expected);
}

#[test]
fn test_tiers_and_overrides() {
    let document = fixtures::items_document(fixtures::feed_items(5));
    let mut high = verdict(ClassificationType::HighInterest, "must read");
    high.title = Some("Rewritten title".into());
    high.description = Some("<p>Rewritten</p>".into());
    let mut blank_override = verdict(ClassificationType::Other, "filler");
    blank_override.title = Some(String::new());

    let results = fixtures::classification([
        ("item-0", high),
        ("item-1", verdict(ClassificationType::Uninterested, "boring")),
        ("item-2", blank_override),
        ("item-3", verdict(ClassificationType::Exclude, "spam")),
    ]);
    let inputs = inputs(&document, &results);

    let report = GenerateRun::new().execute(&request(&inputs)).unwrap();
    assert_eq!(report.matched, 2);

    let items = published(&inputs.output);
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].title, "⭐⭐ Rewritten title");
    assert_eq!(
        items[0].description,
        "<p>Rewritten</p><p><small>[high_interest] must read</small></p>"
    );
    assert_eq!(items[1].title, "Story 2");
    assert_eq!(
        items[1].description,
        "<p>Body 2</p><p><small>[other] filler</small></p>"
    );
}

#[test]
fn test_unknown_tier_is_treated_as_exclude() {
    let document = fixtures::items_document(fixtures::feed_items(1));
    let inputs = {
        let dir = tempfile::tempdir().unwrap();
        let items = dir.path().join("items.json");
        let results = dir.path().join("results.json");
        document.write(&items).unwrap();
        fs::write(
            &results,
            r#"{"source_name": "Example", "source_url": "https://example.com/rss",
                "results": {"item-0": {"type": "maybe_later", "reason": "?"}}}"#,
        )
        .unwrap();
        let output = dir.path().join("feed.xml");
        Inputs {
            dir,
            items,
            results,
            output,
        }
    };

    let report = GenerateRun::new().execute(&request(&inputs)).unwrap();
    assert_eq!(report.matched, 0);
    assert!(published(&inputs.output).is_empty());
}

#[test]
fn test_result_without_tier_does_not_abort_run() {
    let document = fixtures::items_document(fixtures::feed_items(2));
    let inputs = inputs(&document, &fixtures::classification([]));
    fs::write(
        &inputs.results,
        r#"{"results": {"item-0": {"type": "interest", "reason": "rust"},
                        "item-1": {"reason": "tier missing"}}}"#,
    )
    .unwrap();

    let report = GenerateRun::new().execute(&request(&inputs)).unwrap();

    assert_eq!(report.matched, 1);
    let items = published(&inputs.output);
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].guid, "item-0");
}

#[test]
fn test_title_precedence() {
    let mut document = fixtures::items_document(fixtures::feed_items(1));
    let results = fixtures::classification([]);

    let inputs_a = inputs(&document, &results);
    let explicit = GenerateRequest {
        title: Some("  My Picks  ".into()),
        ..request(&inputs_a)
    };
    assert_eq!(GenerateRun::new().execute(&explicit).unwrap().title, "My Picks");

    let report = GenerateRun::new().execute(&request(&inputs_a)).unwrap();
    assert_eq!(report.title, "Example News");

    document.source_title = None;
    let inputs_b = inputs(&document, &results);
    let report = GenerateRun::new().execute(&request(&inputs_b)).unwrap();
    assert_eq!(report.title, "Example - Curated");

    let xml = fs::read_to_string(&inputs_b.output).unwrap();
    assert!(xml.contains("<title>Example - Curated</title>"));
    assert!(xml.contains("<link>https://example.com/rss</link>"));
    assert!(xml.contains("<lastBuildDate>"));
}

#[test]
fn test_rerun_keeps_previous_items() {
    let first = fixtures::items_document(fixtures::prefixed_items("a", 2));
    let results = fixtures::classification([
        ("a-0", verdict(ClassificationType::Other, "r")),
        ("a-1", verdict(ClassificationType::Other, "r")),
    ]);
    let inputs = inputs(&first, &results);
    GenerateRun::new().execute(&request(&inputs)).unwrap();

    let second = fixtures::items_document(fixtures::prefixed_items("b", 1));
    second.write(&inputs.items).unwrap();
    fs::write(
        &inputs.results,
        serde_json::to_string(&fixtures::classification([(
            "b-0",
            verdict(ClassificationType::Interest, "r"),
        )]))
        .unwrap(),
    )
    .unwrap();
    GenerateRun::new().execute(&request(&inputs)).unwrap();

    let guids: Vec<String> = published(&inputs.output).into_iter().map(|i| i.guid).collect();
    assert_eq!(guids, vec!["b-0", "a-0", "a-1"]);
    assert!(inputs.dir.path().exists());
}

#[test]
fn test_unreadable_inputs_are_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let request = GenerateRequest::new(
        dir.path().join("missing-items.json"),
        dir.path().join("missing-results.json"),
        dir.path().join("feed.xml"),
    );

    let err = GenerateRun::new().execute(&request).unwrap_err();
    assert_eq!(err.code(), "INPUT_001");
    assert!(err.is_fatal());
    assert!(!dir.path().join("feed.xml").exists());
}
