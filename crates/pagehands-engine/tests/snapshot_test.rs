//! Snapshot extraction against an in-memory page.

mod common;

use std::time::Duration;

use common::{FakeNode, FakePage, engine, outline};
use pagehands_engine::{PageEngine, SNAPSHOT_UNAVAILABLE};
use pagehands_protocols::{ElementHandle, EngineError, ErrorKind, Snapshot};

fn static_page() -> std::sync::Arc<FakePage> {
    FakePage::new(vec![
        FakeNode::new("style").text("body { color: red }"),
        FakeNode::new("script").text("console.log(1)"),
        FakeNode::button("Sign in"),
        FakeNode::input("Email"),
        FakeNode::new("a").attr("href", "/help").text("Help"),
        FakeNode::new("div"),
        FakeNode::new("span").text("Footer").hidden(),
    ])
}

#[tokio::test]
async fn test_repeated_snapshots_are_stable() {
    let page = static_page();
    let engine = engine(&page);

    let first = engine.snapshot().await.unwrap();
    let second = engine.snapshot().await.unwrap();

    assert_eq!(outline(&first), outline(&second));
    assert!(second.generation > first.generation);
    for (i, element) in second.elements.iter().enumerate() {
        assert_eq!(element.handle, ElementHandle(i as u32));
    }
}

#[tokio::test]
async fn test_skip_listed_and_empty_nodes_are_dropped() {
    let page = static_page();
    let engine = engine(&page);

    let snapshot = engine.snapshot().await.unwrap();
    let tags: Vec<&str> = snapshot.elements.iter().map(|e| e.tag_name.as_str()).collect();

    assert_eq!(tags, vec!["button", "input", "a"]);
}

#[tokio::test]
async fn test_stamps_never_leak_into_snapshot() {
    let page = static_page();
    let engine = engine(&page);

    engine.snapshot().await.unwrap();
    assert!(engine.click(ElementHandle(0)).await.success);

    let snapshot = engine.snapshot().await.unwrap();
    for element in &snapshot.elements {
        assert!(!element.attributes.contains_key("data-pagehands-id"));
    }
    // The stamped button still deduplicates as the same element.
    assert_eq!(snapshot.elements.len(), 3);
}

#[tokio::test]
async fn test_visible_duplicate_wins() {
    let page = FakePage::new(vec![
        FakeNode::input("Search").hidden(),
        FakeNode::input("Search"),
    ]);
    let engine = engine(&page);

    let snapshot = engine.snapshot().await.unwrap();

    assert_eq!(snapshot.elements.len(), 1);
    assert!(snapshot.elements[0].visible);

    assert!(engine.set_value(ElementHandle(0), "x").await.success);
    assert_eq!(page.value(1), "x");
    assert_eq!(page.value(0), "");
}

#[tokio::test]
async fn test_rendered_text() {
    let page = static_page();
    let engine = engine(&page);

    let text = engine.extract_snapshot().await;

    assert!(text.starts_with("Page: Fake page\nURL: https://example.com/\n"));
    assert!(text.contains("[0]<button>Sign in</button>"));
    assert!(text.contains("[1]<input placeholder=\"Email\" />"));
    assert!(text.contains("[2]<a href=\"/help\">Help</a>"));
    assert!(!text.contains("script"));
}

#[tokio::test]
async fn test_new_snapshot_invalidates_old_handles() {
    let page = static_page();
    let engine = engine(&page);

    engine.snapshot().await.unwrap();
    let before = engine.registry().generation();
    engine.snapshot().await.unwrap();

    assert!(engine.registry().generation() > before);
    assert_eq!(engine.registry().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_hung_walker_yields_sentinel() {
    let page = static_page();
    page.hang("snapshot_walker");
    let engine = engine(&page);

    assert_eq!(engine.extract_snapshot().await, SNAPSHOT_UNAVAILABLE);
    assert!(matches!(
        engine.snapshot().await,
        Err(EngineError::ScriptTimeout { .. })
    ));
}

#[tokio::test]
async fn test_unbound_engine_yields_sentinel() {
    let page = static_page();
    let engine = PageEngine::new(page.clone(), common::fast_config());

    assert_eq!(engine.extract_snapshot().await, SNAPSHOT_UNAVAILABLE);
    assert!(matches!(
        engine.snapshot().await,
        Err(EngineError::TabNotBound)
    ));
    assert!(page.calls().is_empty());
}

fn texts(snapshot: &Snapshot) -> Vec<&str> {
    snapshot.elements.iter().map(|e| e.text.as_str()).collect()
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_snapshots_keep_handles_consistent() {
    let page = FakePage::new(vec![FakeNode::button("Delete account"), FakeNode::button("Save")]);
    page.delay_next_reply("snapshot_walker", Duration::from_millis(50));
    let engine = engine(&page);

    // The first pass walks the page, then its reply is held back while the
    // page changes and a second pass is requested.
    let (first, second) = tokio::join!(engine.snapshot(), async {
        page.remove(0);
        engine.snapshot().await
    });
    let first = first.unwrap();
    let second = second.unwrap();

    assert_eq!(texts(&first), vec!["Delete account", "Save"]);
    assert_eq!(texts(&second), vec!["Save"]);
    assert!(second.generation > first.generation);
    assert_eq!(engine.registry().generation(), second.generation);
    assert_eq!(engine.registry().len(), 1);

    let result = engine.click(ElementHandle(0)).await;
    assert!(result.success);
    assert_eq!(page.node(0).clicks, 0);
    assert_eq!(page.node(1).clicks, 1);

    // Nothing the newest snapshot did not name is reachable.
    let result = engine.click(ElementHandle(1)).await;
    assert_eq!(result.error_kind, Some(ErrorKind::NotFound));
    assert_eq!(page.node(0).clicks, 0);
}

#[tokio::test(start_paused = true)]
async fn test_snapshot_interrupted_by_navigation_is_rejected() {
    let page = FakePage::new(vec![FakeNode::button("Delete account"), FakeNode::button("Save")]);
    page.delay_next_reply("snapshot_walker", Duration::from_millis(50));
    let engine = engine(&page);

    let (snapshot, navigation) =
        tokio::join!(engine.snapshot(), engine.navigate("https://example.com/next"));

    assert!(navigation.success);
    assert!(matches!(
        snapshot,
        Err(EngineError::SnapshotSuperseded { .. })
    ));
    assert!(engine.registry().is_empty());
    assert_eq!(
        engine.click(ElementHandle(0)).await.error_kind,
        Some(ErrorKind::NotFound)
    );
    assert_eq!(page.node(0).clicks, 0);
}
