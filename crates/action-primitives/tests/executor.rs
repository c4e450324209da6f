//! Executor behaviour against the scripted page.

use std::sync::Arc;

use action_primitives::{ActionExecutor, ExecutorConfig};
use cdp_adapter::fake::{
    ClickEffect, FakeElement, FakePage, MouseRecord, ScreenshotRecord, ScrollRecord, PNG_SIGNATURE,
};
use cdp_adapter::{ClickMode, PageDriver, ScrollTo};
use perceiver_structural::{ElementReference, LocatorHints, PageSnapshot, SnapshotSource};
use surfpilot_core_types::{Action, ActionKind, MouseButton, OutputFormat, ScrollTarget};

fn reference(ref_id: &str, role: &str, name: &str) -> ElementReference {
    ElementReference {
        ref_id: ref_id.into(),
        role: role.into(),
        name: name.into(),
        description: String::new(),
        value: String::new(),
        checked: None,
        disabled: false,
        expanded: None,
        tag: None,
        hints: LocatorHints {
            role: role.into(),
            name: name.into(),
            ..LocatorHints::default()
        },
    }
}

fn snapshot(url: &str, refs: Vec<ElementReference>) -> PageSnapshot {
    PageSnapshot::from_references(url, String::new(), refs, SnapshotSource::Accessibility)
}

fn executor(page: &Arc<FakePage>) -> ActionExecutor {
    let driver: Arc<dyn PageDriver> = page.clone();
    ActionExecutor::new(driver).with_config(ExecutorConfig::immediate())
}

#[tokio::test]
async fn click_escalates_to_script_after_two_failures() {
    let page = Arc::new(
        FakePage::new("https://example.com").with_element(
            FakeElement::new("h1", "button", "button", "Apply now")
                .failing_on(ClickMode::Standard)
                .failing_on(ClickMode::Forced),
        ),
    );
    let snap = snapshot("https://example.com", vec![reference("e1", "button", "Apply now")]);

    let result = executor(&page)
        .execute(&Action::Click { element_id: "e1".into() }, &snap)
        .await;

    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.attempts, 3);
    let modes: Vec<_> = page.clicks().iter().map(|c| c.mode).collect();
    assert_eq!(modes, vec![ClickMode::Standard, ClickMode::Forced, ClickMode::Script]);
    assert_eq!(result.target.map(|t| t.ref_id), Some("e1".to_string()));
}

#[tokio::test]
async fn click_reports_last_error_when_every_rung_fails() {
    let page = Arc::new(
        FakePage::new("https://example.com").with_element(
            FakeElement::new("h1", "button", "button", "Covered")
                .failing_on(ClickMode::Standard)
                .failing_on(ClickMode::Forced)
                .failing_on(ClickMode::Script),
        ),
    );
    let snap = snapshot("https://example.com", vec![reference("e1", "button", "Covered")]);

    let result = executor(&page)
        .execute(&Action::Click { element_id: "[e1]".into() }, &snap)
        .await;

    assert!(!result.success);
    assert_eq!(result.attempts, 3);
    let error = result.error.unwrap_or_default();
    assert!(error.contains("3 attempts"), "{error}");
    assert!(error.contains("Script"), "{error}");
}

#[tokio::test]
async fn click_on_unknown_reference_fails_without_touching_the_page() {
    let page = Arc::new(FakePage::new("https://example.com"));
    let snap = snapshot("https://example.com", vec![]);

    let result = executor(&page)
        .execute(&Action::Click { element_id: "e9".into() }, &snap)
        .await;

    assert!(!result.success);
    assert!(result.error.unwrap_or_default().contains("e9"));
    assert!(page.clicks().is_empty());
}

#[tokio::test]
async fn search_input_is_typed_and_submitted() {
    let page = Arc::new(
        FakePage::new("https://search.example").with_element(
            FakeElement::new("h1", "textarea", "combobox", "Search")
                .with_attribute("name", "q")
                .on_click(ClickEffect::None)
                .submits_to("https://search.example/?q=rust"),
        ),
    );
    let snap = snapshot("https://search.example", vec![reference("e1", "combobox", "Search")]);

    let result = executor(&page)
        .execute(
            &Action::InputText {
                element_id: "e1".into(),
                text: "rust".into(),
            },
            &snap,
        )
        .await;

    assert!(result.success, "{:?}", result.error);
    assert_eq!(page.value_of("h1").as_deref(), Some("rust"));
    assert_eq!(page.keys(), vec!["Enter"]);
    assert_eq!(page.current_url(), "https://search.example/?q=rust");
}

#[tokio::test]
async fn password_input_is_never_submitted() {
    let page = Arc::new(
        FakePage::new("https://login.example").with_element(
            FakeElement::new("h1", "input", "textbox", "Password")
                .with_attribute("type", "password")
                .submits_to("https://login.example/session"),
        ),
    );
    let snap = snapshot("https://login.example", vec![reference("e1", "textbox", "Password")]);

    let result = executor(&page)
        .execute(
            &Action::InputText {
                element_id: "e1".into(),
                text: "hunter2".into(),
            },
            &snap,
        )
        .await;

    assert!(result.success);
    assert_eq!(page.value_of("h1").as_deref(), Some("hunter2"));
    assert!(page.keys().is_empty());
    assert_eq!(page.current_url(), "https://login.example");
}

#[tokio::test]
async fn input_falls_back_to_common_search_inputs() {
    let page = Arc::new(
        FakePage::new("https://shop.example").with_element(
            FakeElement::new("h7", "input", "textbox", "")
                .with_attribute("name", "q")
                .with_selector(r#"input[name="q"]"#),
        ),
    );
    let snap = snapshot("https://shop.example", vec![reference("e3", "searchbox", "Products")]);

    let result = executor(&page)
        .execute(
            &Action::InputText {
                element_id: "e3".into(),
                text: "kettle".into(),
            },
            &snap,
        )
        .await;

    assert!(result.success, "{:?}", result.error);
    assert_eq!(page.value_of("h7").as_deref(), Some("kettle"));
    assert!(result.detail.unwrap_or_default().contains("Enter"));
}

#[tokio::test]
async fn fallback_input_is_classified_by_its_own_attributes() {
    let page = Arc::new(
        FakePage::new("https://shop.example").with_element(
            FakeElement::new("h7", "input", "textbox", "")
                .with_attribute("name", "q")
                .with_attribute("type", "search")
                .with_selector(r#"input[type="search"]"#)
                .submits_to("https://shop.example/?q=kettle"),
        ),
    );
    // The stale reference looked like a credential field.
    let snap = snapshot("https://shop.example", vec![reference("e3", "textbox", "Password")]);

    let result = executor(&page)
        .execute(
            &Action::InputText {
                element_id: "e3".into(),
                text: "kettle".into(),
            },
            &snap,
        )
        .await;

    assert!(result.success, "{:?}", result.error);
    assert_eq!(page.keys(), vec!["Enter"]);
    assert_eq!(page.current_url(), "https://shop.example/?q=kettle");
}

#[tokio::test]
async fn existing_value_is_cleared_before_typing() {
    let mut field = FakeElement::new("h1", "input", "textbox", "City");
    field.value = "Oslo".into();
    let page = Arc::new(FakePage::new("https://form.example").with_element(field));
    let snap = snapshot("https://form.example", vec![reference("e1", "textbox", "City")]);

    executor(&page)
        .execute(
            &Action::InputText {
                element_id: "e1".into(),
                text: "Lima".into(),
            },
            &snap,
        )
        .await;

    assert_eq!(page.value_of("h1").as_deref(), Some("Lima"));
}

#[tokio::test]
async fn missing_dropdown_option_is_a_failed_result() {
    let page = Arc::new(
        FakePage::new("https://form.example")
            .with_element(FakeElement::new("h1", "select", "combobox", "Country").with_options(["Norway", "Peru"])),
    );
    let snap = snapshot("https://form.example", vec![reference("e1", "combobox", "Country")]);
    let exec = executor(&page);

    let ok = exec
        .execute(
            &Action::SelectOption {
                element_id: "e1".into(),
                option: "peru".into(),
            },
            &snap,
        )
        .await;
    assert!(ok.success);
    assert_eq!(page.value_of("h1").as_deref(), Some("Peru"));

    let missing = exec
        .execute(
            &Action::SelectOption {
                element_id: "e1".into(),
                option: "Atlantis".into(),
            },
            &snap,
        )
        .await;
    assert!(!missing.success);
    assert!(missing.error.unwrap_or_default().contains("Option not found"));
}

#[tokio::test]
async fn drag_presses_moves_and_releases() {
    let page = Arc::new(FakePage::new("https://canvas.example"));
    let snap = snapshot("https://canvas.example", vec![]);
    let exec = executor(&page);

    exec.execute(&Action::MoveXy { x: 10.0, y: 10.0, steps: 1 }, &snap)
        .await;
    let result = exec
        .execute(
            &Action::DragXy {
                x: 30.0,
                y: 10.0,
                steps: 2,
                button: MouseButton::Left,
            },
            &snap,
        )
        .await;

    assert!(result.success);
    assert_eq!(
        page.mouse_events(),
        vec![
            MouseRecord::Move { x: 10.0, y: 10.0 },
            MouseRecord::Down { x: 10.0, y: 10.0, button: MouseButton::Left },
            MouseRecord::Move { x: 20.0, y: 10.0 },
            MouseRecord::Move { x: 30.0, y: 10.0 },
            MouseRecord::Up { x: 30.0, y: 10.0, button: MouseButton::Left },
        ]
    );
}

#[tokio::test]
async fn keypress_presses_each_key_in_order() {
    let page = Arc::new(FakePage::new("https://example.com"));
    let snap = snapshot("https://example.com", vec![]);

    let result = executor(&page)
        .execute(&Action::Keypress { keys: "Tab, Control+A".into() }, &snap)
        .await;

    assert!(result.success);
    assert_eq!(page.keys(), vec!["Tab", "Control+A"]);
}

#[tokio::test]
async fn navigation_timeout_is_an_ordinary_failure() {
    let page = Arc::new(FakePage::new("https://example.com"));
    page.fail_navigation_to("https://slow.example/");
    let snap = snapshot("https://example.com", vec![]);
    let exec = executor(&page);

    let slow = exec
        .execute(&Action::GotoUrl { url: "https://slow.example/".into() }, &snap)
        .await;
    assert!(!slow.success);
    assert!(slow.error.unwrap_or_default().starts_with("Navigation timeout"));

    let fine = exec
        .execute(&Action::GotoUrl { url: "example.org".into() }, &snap)
        .await;
    assert!(fine.success);
    assert_eq!(page.current_url(), "https://example.org");

    let back = exec.execute(&Action::GoBack, &snap).await;
    assert!(back.success);
    assert_eq!(page.current_url(), "https://example.com");
}

#[tokio::test]
async fn scroll_targets_map_to_window_and_element_scrolls() {
    let page = Arc::new(
        FakePage::new("https://feed.example").with_element(FakeElement::new("h4", "a", "link", "Older posts")),
    );
    let snap = snapshot("https://feed.example", vec![reference("e2", "link", "Older posts")]);
    let exec = executor(&page);

    assert!(exec.execute(&Action::Scroll { target: ScrollTarget::Pixels(-250) }, &snap).await.success);
    assert!(exec.execute(&Action::Scroll { target: ScrollTarget::Bottom }, &snap).await.success);
    assert!(
        exec.execute(&Action::Scroll { target: ScrollTarget::Element("e2".into()) }, &snap)
            .await
            .success
    );
    assert!(!exec.execute(&Action::Scroll { target: ScrollTarget::Pixels(0) }, &snap).await.success);

    assert_eq!(
        page.scrolls(),
        vec![
            ScrollRecord::Window(ScrollTo::By(-250)),
            ScrollRecord::Window(ScrollTo::Bottom),
            ScrollRecord::Element("h4".into()),
        ]
    );
}

#[tokio::test]
async fn wait_is_clamped_to_the_configured_maximum() {
    let page = Arc::new(FakePage::new("https://example.com"));
    let snap = snapshot("https://example.com", vec![]);
    let driver: Arc<dyn PageDriver> = page.clone();
    let exec = ActionExecutor::new(driver).with_config(ExecutorConfig {
        max_wait_secs: 0.01,
        ..ExecutorConfig::immediate()
    });

    let started = std::time::Instant::now();
    let result = exec.execute(&Action::Wait { seconds: 120.0 }, &snap).await;

    assert!(result.success);
    assert!(started.elapsed() < std::time::Duration::from_secs(5));
    assert_eq!(result.detail.as_deref(), Some("waited 0.01s"));
}

#[tokio::test]
async fn screenshots_are_written_under_the_configured_dir() {
    let dir = tempfile::tempdir().expect("temp dir");
    let page = Arc::new(
        FakePage::new("https://shop.example").with_element(FakeElement::new("h5", "img", "img", "Kettle")),
    );
    let snap = snapshot("https://shop.example", vec![reference("e4", "img", "Kettle")]);
    let driver: Arc<dyn PageDriver> = page.clone();
    let exec = ActionExecutor::new(driver).with_config(ExecutorConfig {
        screenshot_dir: dir.path().join("shots"),
        ..ExecutorConfig::immediate()
    });

    let full = exec
        .execute(
            &Action::Screenshot {
                element_id: None,
                full_page: true,
                filename: Some("landing".into()),
            },
            &snap,
        )
        .await;
    assert!(full.success, "{:?}", full.error);
    let written = dir.path().join("shots").join("landing.png");
    assert_eq!(full.detail.as_deref(), Some(written.display().to_string().as_str()));
    assert!(std::fs::read(&written).expect("png on disk").starts_with(&PNG_SIGNATURE));

    let element = exec
        .execute(
            &Action::Screenshot {
                element_id: Some("e4".into()),
                full_page: false,
                filename: None,
            },
            &snap,
        )
        .await;
    assert!(element.success, "{:?}", element.error);
    assert_eq!(element.target.map(|t| t.ref_id), Some("e4".to_string()));

    let missing = exec
        .execute(
            &Action::Screenshot {
                element_id: Some("e99".into()),
                full_page: false,
                filename: None,
            },
            &snap,
        )
        .await;
    assert!(!missing.success);

    assert_eq!(
        page.screenshots(),
        vec![
            ScreenshotRecord { element: None, full_page: true },
            ScreenshotRecord { element: Some("h5".into()), full_page: false },
        ]
    );
}

#[tokio::test]
async fn terminal_actions_succeed_without_page_interaction() {
    let page = Arc::new(FakePage::new("https://example.com"));
    let snap = snapshot("https://example.com", vec![]);

    let result = executor(&page)
        .execute(
            &Action::Complete {
                extracted_data: None,
                output_format: OutputFormat::Json,
                output_title: None,
            },
            &snap,
        )
        .await;

    assert!(result.success);
    assert_eq!(result.action, ActionKind::Complete);
    assert!(page.clicks().is_empty());
    assert_eq!(page.revision(), 0);
}
