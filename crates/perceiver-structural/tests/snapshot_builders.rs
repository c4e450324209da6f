use cdp_adapter::fake::FakePage;
use cdp_adapter::AxNode;
use perceiver_structural::{
    AccessibilitySnapshotBuilder, DomSnapshotBuilder, SnapshotBuilder, SnapshotSource,
};

#[tokio::test]
async fn query_failure_yields_error_sentinel() {
    let page = FakePage::new("https://a.test/login");
    page.fail_accessibility("target closed");

    let snapshot = AccessibilitySnapshotBuilder::default().build(&page).await;
    assert!(snapshot.is_error());
    assert!(snapshot.is_empty());
    assert_eq!(snapshot.url, "https://a.test/login");
    assert!(snapshot.error.as_deref().unwrap_or_default().contains("target closed"));
}

#[tokio::test]
async fn empty_tree_is_reported_as_a_capture_error() {
    let page = FakePage::new("https://a.test");
    let err = AccessibilitySnapshotBuilder::default()
        .capture(&page)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("empty"));
}

#[tokio::test]
async fn accessibility_builder_reads_the_live_tree() {
    let page = FakePage::new("https://a.test").with_ax_nodes(vec![
        AxNode::new("1", "RootWebArea", "").with_children(["2"]),
        AxNode::new("2", "link", "Docs"),
    ]);
    let snapshot = AccessibilitySnapshotBuilder::default().build(&page).await;
    assert_eq!(snapshot.source, SnapshotSource::Accessibility);
    assert_eq!(snapshot.get("e1").map(|r| r.name.as_str()), Some("Docs"));
}

#[tokio::test]
async fn dom_builder_reads_serialized_content() {
    let page = FakePage::new("https://a.test")
        .with_html("<html><body><a href=\"/x\">Next page</a></body></html>");
    let snapshot = DomSnapshotBuilder::default().build(&page).await;
    assert_eq!(snapshot.source, SnapshotSource::Dom);
    assert!(snapshot.text.contains("[e1] link \"Next page\""));
}
