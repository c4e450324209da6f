//! Replaying a recorded session on a fresh page.

use std::sync::Arc;

use action_primitives::ActionExecutor;
use agent_core::{
    replay_session, AgentConfig, AgentError, MockLanguageModel, Orchestrator, PageFactory,
    ReplayOptions, SessionPaths,
};
use async_trait::async_trait;
use cdp_adapter::fake::{ClickEffect, FakeElement, FakePage};
use cdp_adapter::{AdapterError, AxNode, PageDriver};
use surfpilot_core_types::ActionKind;
use tempfile::TempDir;

const START_URL: &str = "https://example.com/login";

struct SharedPage(Arc<FakePage>);

#[async_trait]
impl PageFactory for SharedPage {
    async fn open(&self) -> Result<Arc<dyn PageDriver>, AdapterError> {
        let page: Arc<dyn PageDriver> = self.0.clone();
        Ok(page)
    }
}

fn login_page(with_button: bool) -> Arc<FakePage> {
    let page = FakePage::new("about:blank").with_ax_nodes(vec![
        AxNode::new("1", "RootWebArea", "Sign in").with_children(["2"]),
        AxNode::new("2", "button", "Login"),
    ]);
    let page = if with_button {
        page.with_element(FakeElement::new("login", "button", "button", "Login").on_click(ClickEffect::Mutate))
    } else {
        page
    };
    Arc::new(page)
}

fn executor(page: &Arc<FakePage>) -> ActionExecutor {
    let driver: Arc<dyn PageDriver> = page.clone();
    ActionExecutor::new(driver).with_config(AgentConfig::minimal().executor_config())
}

/// Record a session of click, wait, complete and return its id.
async fn record(dir: &TempDir) -> String {
    record_script(
        dir,
        &[
            r#"{"action_type": "click", "element_id": "e1"}"#,
            r#"{"action_type": "wait", "seconds": 1}"#,
            r#"{"action_type": "complete"}"#,
        ],
    )
    .await
}

async fn record_script(dir: &TempDir, decisions: &[&str]) -> String {
    let mut script = vec![r#"{"steps": ["Click Login"]}"#.to_string()];
    script.extend(decisions.iter().map(|d| d.to_string()));
    let model = Arc::new(MockLanguageModel::new(script));
    let paths = SessionPaths {
        cookies_dir: dir.path().join("cookies"),
        logs_dir: dir.path().join("logs"),
        output_dir: dir.path().join("output"),
    };
    let outcome = Orchestrator::new(model, Arc::new(SharedPage(login_page(true))), AgentConfig::minimal(), paths)
        .run("log in", Some(START_URL))
        .await;
    assert!(outcome.succeeded(), "{}", outcome.message);
    outcome.session_id
}

fn fast() -> ReplayOptions {
    ReplayOptions {
        speed: 100.0,
        continue_on_error: false,
    }
}

#[tokio::test]
async fn replays_logged_actions_through_recorded_hints() {
    let dir = TempDir::new().expect("tempdir");
    let session_id = record(&dir).await;
    let page = login_page(true);

    let report = replay_session(&dir.path().join("logs"), &session_id, executor(&page), fast())
        .await
        .expect("replay");

    assert_eq!(page.current_url(), START_URL);
    assert_eq!(report.total, 2);
    assert!(report.all_succeeded());
    let kinds: Vec<_> = report.results.iter().map(|r| r.action).collect();
    assert_eq!(kinds, vec![ActionKind::Click, ActionKind::Wait]);
    assert_eq!(page.clicks().len(), 1);
}

#[tokio::test]
async fn replay_stops_at_the_first_failure_unless_told_otherwise() {
    let dir = TempDir::new().expect("tempdir");
    let session_id = record(&dir).await;
    let logs = dir.path().join("logs");

    let page = login_page(false);
    let stopped = replay_session(&logs, &session_id, executor(&page), fast())
        .await
        .expect("replay");
    assert_eq!(stopped.results.len(), 1);
    assert_eq!(stopped.succeeded, 0);

    let page = login_page(false);
    let options = ReplayOptions {
        continue_on_error: true,
        ..fast()
    };
    let continued = replay_session(&logs, &session_id, executor(&page), options)
        .await
        .expect("replay");
    assert_eq!(continued.results.len(), 2);
    assert_eq!(continued.succeeded, 1);
}

#[tokio::test]
async fn rejected_decisions_are_not_replayed() {
    let dir = TempDir::new().expect("tempdir");
    let session_id = record_script(
        &dir,
        &[
            r#"{"action_type": "click", "element_id": "e9"}"#,
            r#"{"action_type": "click", "element_id": "e1"}"#,
            r#"{"action_type": "complete"}"#,
        ],
    )
    .await;
    let logs = dir.path().join("logs");
    let log = agent_core::load_session(&logs, &session_id).expect("log");
    assert!(!log.actions[0].executed);
    assert!(log.actions[0].action.is_some());
    assert!(log.actions[1].executed);

    let page = login_page(true);
    let report = replay_session(&logs, &session_id, executor(&page), fast())
        .await
        .expect("replay");

    assert_eq!(report.total, 1);
    assert!(report.all_succeeded());
    assert_eq!(page.clicks().len(), 1);
}

#[tokio::test]
async fn unknown_sessions_are_reported() {
    let dir = TempDir::new().expect("tempdir");
    let page = login_page(true);
    let err = replay_session(dir.path(), "session_00000000", executor(&page), fast())
        .await
        .expect_err("missing session");
    assert!(matches!(err, AgentError::SessionNotFound(_)));
}
