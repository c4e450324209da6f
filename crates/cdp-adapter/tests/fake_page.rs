//! Behavioural checks for the scripted page other crates test against.

use std::time::Duration;

use cdp_adapter::fake::{
    ClickEffect, FakeElement, FakePage, ScreenshotRecord, ScrollRecord, PNG_SIGNATURE,
};
use cdp_adapter::{AdapterErrorKind, ClickMode, ElementQuery, PageDriver, ScrollTo};

fn search_page() -> FakePage {
    FakePage::new("https://example.com")
        .with_text("Example Domain")
        .with_element(
            FakeElement::new("h1", "input", "searchbox", "Search")
                .with_attribute("name", "q")
                .with_selector("input[name=\"q\"]")
                .submits_to("https://example.com/search?q=rust"),
        )
        .with_element(
            FakeElement::new("h2", "button", "button", "Search now")
                .with_xpath("/html/body/form/button")
                .failing_on(ClickMode::Standard),
        )
        .with_element(
            FakeElement::new("h3", "select", "combobox", "Country").with_options(["Norway", "Peru"]),
        )
}

#[tokio::test]
async fn role_queries_support_exact_and_substring_names() {
    let page = search_page();
    let exact = page
        .query(&ElementQuery::Role {
            role: "button".into(),
            name: "search now".into(),
            exact: true,
        })
        .await
        .expect("query");
    assert_eq!(exact.len(), 1);

    let substring = page
        .query(&ElementQuery::Role {
            role: "searchbox".into(),
            name: "sea".into(),
            exact: false,
        })
        .await
        .expect("query");
    assert_eq!(substring[0].id, "h1");

    let none = page
        .query(&ElementQuery::XPath {
            xpath: "/html/body/div".into(),
        })
        .await
        .expect("query");
    assert!(none.is_empty());
}

#[tokio::test]
async fn typing_into_focused_field_and_submitting_navigates() {
    let page = search_page();
    let handle = page
        .query(&ElementQuery::Css {
            selector: "input[name=\"q\"]".into(),
        })
        .await
        .expect("query")
        .remove(0);

    page.focus(&handle).await.expect("focus");
    for ch in "rust".chars() {
        page.type_char(ch).await.expect("type");
    }
    assert_eq!(page.value_of("h1").as_deref(), Some("rust"));

    page.press_key("Enter").await.expect("enter");
    assert_eq!(page.current_url(), "https://example.com/search?q=rust");
}

#[tokio::test]
async fn failing_click_modes_are_recorded_and_rejected() {
    let page = search_page();
    let handle = page
        .query(&ElementQuery::XPath {
            xpath: "/html/body/form/button".into(),
        })
        .await
        .expect("query")
        .remove(0);

    let err = page
        .click(&handle, ClickMode::Standard, Duration::from_secs(1))
        .await
        .unwrap_err();
    assert_eq!(err.kind, AdapterErrorKind::NotInteractable);
    page.click(&handle, ClickMode::Forced, Duration::from_secs(1))
        .await
        .expect("forced click");

    let clicks = page.clicks();
    assert_eq!(clicks.len(), 2);
    assert!(!clicks[0].succeeded);
    assert!(clicks[1].succeeded);
}

#[tokio::test]
async fn removed_elements_are_detached() {
    let page = search_page();
    let handle = page
        .query(&ElementQuery::Attribute {
            name: "name".into(),
            value: "q".into(),
        })
        .await
        .expect("query")
        .remove(0);
    page.remove_element("h1");
    let err = page.focus(&handle).await.unwrap_err();
    assert_eq!(err.kind, AdapterErrorKind::TargetNotFound);
    assert_eq!(page.count_interactive().await.expect("count"), 2);
}

#[tokio::test]
async fn select_option_matches_case_insensitively() {
    let page = search_page();
    let handle = page
        .query(&ElementQuery::Role {
            role: "combobox".into(),
            name: "Country".into(),
            exact: true,
        })
        .await
        .expect("query")
        .remove(0);
    page.select_option(&handle, "peru").await.expect("select");
    assert_eq!(page.value_of("h3").as_deref(), Some("Peru"));

    let err = page.select_option(&handle, "Chile").await.unwrap_err();
    assert_eq!(err.kind, AdapterErrorKind::OptionNotFound);
}

#[tokio::test]
async fn history_moves_back_and_forward() {
    let page = FakePage::new("https://a.test");
    page.goto("https://b.test", Duration::from_secs(1))
        .await
        .expect("goto");
    page.go_back().await.expect("back");
    assert_eq!(page.current_url(), "https://a.test");
    page.go_forward().await.expect("forward");
    assert_eq!(page.current_url(), "https://b.test");
}

#[tokio::test]
async fn click_effects_change_what_the_verifier_sees() {
    let page = FakePage::new("https://a.test")
        .with_element(FakeElement::new("h1", "button", "button", "Noop").on_click(ClickEffect::None))
        .with_element(
            FakeElement::new("h2", "button", "button", "More").on_click(ClickEffect::Reveal(Box::new(
                FakeElement::new("h9", "a", "link", "Details"),
            ))),
        );
    let before = page.visible_text().await.expect("text");
    let noop = page
        .query(&ElementQuery::Role {
            role: "button".into(),
            name: "Noop".into(),
            exact: true,
        })
        .await
        .expect("query")
        .remove(0);
    page.click(&noop, ClickMode::Standard, Duration::from_secs(1))
        .await
        .expect("click");
    assert_eq!(page.visible_text().await.expect("text"), before);

    let more = page
        .query(&ElementQuery::Role {
            role: "button".into(),
            name: "More".into(),
            exact: true,
        })
        .await
        .expect("query")
        .remove(0);
    page.click(&more, ClickMode::Standard, Duration::from_secs(1))
        .await
        .expect("click");
    assert_eq!(page.count_interactive().await.expect("count"), 3);

    page.scroll_window(ScrollTo::Bottom).await.expect("scroll");
    assert_eq!(page.scrolls(), vec![ScrollRecord::Window(ScrollTo::Bottom)]);
}

#[tokio::test]
async fn url_reads_fail_only_as_often_as_scripted() {
    let page = FakePage::new("https://a.test");
    page.fail_url_reads(1);
    let err = page.url().await.expect_err("first read fails");
    assert_eq!(err.kind, AdapterErrorKind::CdpIo);
    assert_eq!(page.url().await.expect("second read"), "https://a.test");
}

#[tokio::test]
async fn screenshots_are_recorded_and_detached_elements_refused() {
    let page = search_page();
    let viewport = page.screenshot(true).await.expect("page capture");
    assert!(viewport.starts_with(&PNG_SIGNATURE));

    let input = page
        .query(&ElementQuery::Css {
            selector: "input[name=\"q\"]".into(),
        })
        .await
        .expect("query")
        .remove(0);
    page.element_screenshot(&input).await.expect("element capture");
    page.remove_element("h1");
    let err = page.element_screenshot(&input).await.expect_err("detached");
    assert_eq!(err.kind, AdapterErrorKind::TargetNotFound);

    assert_eq!(
        page.screenshots(),
        vec![
            ScreenshotRecord { element: None, full_page: true },
            ScreenshotRecord { element: Some("h1".into()), full_page: false },
        ]
    );
}
