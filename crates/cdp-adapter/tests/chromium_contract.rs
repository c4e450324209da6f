//! Contract tests against a real Chromium. Ignored by default.

use std::env;
use std::time::Duration;

use cdp_adapter::{ChromiumDriver, ClickMode, ElementQuery, LaunchOptions, PageDriver};

fn contract_enabled() -> bool {
    env::var("SURFPILOT_CDP_CONTRACT")
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

const FORM: &str = "data:text/html,<html><body><label for=q>Query</label><input id=q name=q><button onclick=\"document.title='clicked'\">Go</button></body></html>";

#[tokio::test]
#[ignore = "requires Chrome/Chromium; set SURFPILOT_CDP_CONTRACT=1"]
async fn contract_query_type_and_click() {
    if !contract_enabled() {
        eprintln!("skipping CDP contract test (SURFPILOT_CDP_CONTRACT not enabled)");
        return;
    }

    let driver = ChromiumDriver::launch(&LaunchOptions::default())
        .await
        .expect("launch chromium");
    driver
        .goto(FORM, Duration::from_secs(15))
        .await
        .expect("navigate");
    driver
        .wait_for_load(Duration::from_secs(10))
        .await
        .expect("load");

    let tree = driver.accessibility_tree().await.expect("ax tree");
    assert!(tree.iter().any(|node| node.role == "textbox"));

    let field = driver
        .query(&ElementQuery::Role {
            role: "textbox".into(),
            name: "Query".into(),
            exact: true,
        })
        .await
        .expect("query")
        .into_iter()
        .next()
        .expect("textbox present");
    driver.focus(&field).await.expect("focus");
    for ch in "surf".chars() {
        driver.type_char(ch).await.expect("type");
    }

    let button = driver
        .query(&ElementQuery::Role {
            role: "button".into(),
            name: "Go".into(),
            exact: true,
        })
        .await
        .expect("query")
        .into_iter()
        .next()
        .expect("button present");
    driver
        .click(&button, ClickMode::Standard, Duration::from_secs(5))
        .await
        .expect("click");

    let title = driver.evaluate("document.title").await.expect("title");
    assert_eq!(title, "clicked");

    let page_png = driver.screenshot(true).await.expect("page screenshot");
    assert!(page_png.starts_with(b"\x89PNG"));
    let button_png = driver.element_screenshot(&button).await.expect("element screenshot");
    assert!(button_png.starts_with(b"\x89PNG"));
    driver.close().await.expect("close");
}
