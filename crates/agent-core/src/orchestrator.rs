//! Session orchestration: plan once, then think, act and observe until a terminal state.
//!
//! One session owns one page. Every exit path (completion, termination, step exhaustion,
//! a failed page open, an error or panic inside the step loop) goes through the same
//! finalization, which persists the action log and closes the page exactly once.

use std::collections::{BTreeMap, VecDeque};
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use action_gate::{ActionVerifier, DefaultActionVerifier, VerificationResult};
use action_primitives::{normalize_url, ActionExecutor, ExecutorConfig};
use async_trait::async_trait;
use cdp_adapter::{AdapterError, CookieStore, PageDriver};
use futures::FutureExt;
use memory_center::{ActionRecord, AgentMemory};
use perceiver_structural::{
    AccessibilitySnapshotBuilder, DomSnapshotBuilder, PageSnapshot, SnapshotBuilder, SnapshotOptions,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use surfpilot_core_types::{Action, ActionKind, Decision, LogCategory, OutputFormat, SessionId};
use tracing::{debug, error, info, warn, Instrument};

use crate::action_log::{ActionLogger, LoggedAction, SessionClose, SessionStatus};
use crate::errors::AgentError;
use crate::export::Exporter;
use crate::llm::{CompletionRequest, LanguageModel};
use crate::parser::parse_decision;
use crate::planner::{GoalPlanner, LoopIntent};
use crate::prompt::{PromptBuilder, PromptContext};

/// Opens the page a session runs on.
#[async_trait]
pub trait PageFactory: Send + Sync {
    async fn open(&self) -> Result<Arc<dyn PageDriver>, AdapterError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub max_steps: u32,
    pub snapshot_char_budget: usize,
    pub prompt_element_limit: usize,
    pub settle_delay_ms: u64,
    pub click_retry_delay_ms: u64,
    pub scroll_settle_ms: u64,
    pub type_delay_min_ms: u64,
    pub type_delay_max_ms: u64,
    pub action_timeout_ms: u64,
    pub navigation_timeout_ms: u64,
    pub max_wait_secs: f64,
    /// Element-name terms that make a click count toward a loop target.
    pub loop_terms: Vec<String>,
    /// Previous steps repeated back to the model.
    pub history_limit: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: 30,
            snapshot_char_budget: 15_000,
            prompt_element_limit: 100,
            settle_delay_ms: 1000,
            click_retry_delay_ms: 500,
            scroll_settle_ms: 300,
            type_delay_min_ms: 30,
            type_delay_max_ms: 80,
            action_timeout_ms: 5000,
            navigation_timeout_ms: 60_000,
            max_wait_secs: 30.0,
            loop_terms: vec!["apply".to_string(), "submit".to_string()],
            history_limit: 5,
        }
    }
}

impl AgentConfig {
    /// No pacing delays and a short step budget.
    pub fn minimal() -> Self {
        Self {
            max_steps: 10,
            settle_delay_ms: 0,
            click_retry_delay_ms: 0,
            scroll_settle_ms: 0,
            type_delay_min_ms: 0,
            type_delay_max_ms: 0,
            max_wait_secs: 0.0,
            ..Self::default()
        }
    }

    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            action_timeout: Duration::from_millis(self.action_timeout_ms),
            navigation_timeout: Duration::from_millis(self.navigation_timeout_ms),
            click_retry_delay: Duration::from_millis(self.click_retry_delay_ms),
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            scroll_settle: Duration::from_millis(self.scroll_settle_ms),
            type_delay_min_ms: self.type_delay_min_ms,
            type_delay_max_ms: self.type_delay_max_ms.max(self.type_delay_min_ms),
            max_wait_secs: self.max_wait_secs,
            ..ExecutorConfig::default()
        }
    }

    fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }
}

/// Where a session reads cookies from and writes its artifacts to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionPaths {
    pub cookies_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for SessionPaths {
    fn default() -> Self {
        Self {
            cookies_dir: PathBuf::from("./cookies"),
            logs_dir: PathBuf::from("./logs"),
            output_dir: PathBuf::from("./output"),
        }
    }
}

impl SessionPaths {
    pub fn screenshots_dir(&self) -> PathBuf {
        self.output_dir.join("screenshots")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub session_id: String,
    pub status: SessionStatus,
    pub message: String,
    pub steps: u32,
    pub duration_ms: u64,
    pub log_path: Option<PathBuf>,
    pub artifacts: Vec<PathBuf>,
    pub loop_counter: u32,
    pub loop_target: Option<u32>,
    pub extracted_data: Option<Value>,
}

impl SessionOutcome {
    pub fn succeeded(&self) -> bool {
        self.status == SessionStatus::Completed
    }
}

/// Mutable state of one running session.
struct Session {
    goal: String,
    memory: AgentMemory,
    logger: ActionLogger,
    history: VecDeque<String>,
    loop_intent: Option<LoopIntent>,
    artifacts: Vec<PathBuf>,
    extracted: Option<Value>,
    steps: u32,
}

impl Session {
    fn note(&mut self, line: String, limit: usize) {
        self.history.push_back(line);
        while self.history.len() > limit.max(1) {
            self.history.pop_front();
        }
    }
}

enum StepOutcome {
    Continue,
    Finished(SessionStatus, String),
}

pub struct Orchestrator {
    model: Arc<dyn LanguageModel>,
    pages: Arc<dyn PageFactory>,
    config: AgentConfig,
    paths: SessionPaths,
    prompts: PromptBuilder,
}

impl Orchestrator {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        pages: Arc<dyn PageFactory>,
        config: AgentConfig,
        paths: SessionPaths,
    ) -> Self {
        let prompts = PromptBuilder::new(config.prompt_element_limit, config.snapshot_char_budget);
        Self {
            model,
            pages,
            config,
            paths,
            prompts,
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Run one session to a terminal state. Failures are reported in the outcome.
    pub async fn run(&self, goal: &str, start_url: Option<&str>) -> SessionOutcome {
        let session_id = SessionId::new();
        self.run_session(session_id, goal, start_url)
            .instrument(LogCategory::Workflow.span("orchestrator"))
            .await
    }

    async fn run_session(&self, session_id: SessionId, goal: &str, start_url: Option<&str>) -> SessionOutcome {
        let started = Instant::now();
        info!(session = %session_id, goal, start_url = start_url.unwrap_or_default(), "Session started");
        let mut session = Session {
            goal: goal.to_string(),
            memory: AgentMemory::new(),
            logger: ActionLogger::start(&self.paths.logs_dir, &session_id, goal, start_url),
            history: VecDeque::new(),
            loop_intent: None,
            artifacts: Vec::new(),
            extracted: None,
            steps: 0,
        };

        let page = match self.pages.open().await {
            Ok(page) => page,
            Err(err) => {
                error!(error = %err, "Could not open a browser page");
                let message = format!("failed to open browser page: {err}");
                return self.finalize(session, SessionStatus::Error, message, started);
            }
        };

        self.initialize(&mut session, page.as_ref(), start_url).await;
        self.plan(&mut session, start_url).await;

        let driven = AssertUnwindSafe(self.drive(&mut session, page.clone()))
            .catch_unwind()
            .await;
        let (status, message) = match driven {
            Ok(Ok(finished)) => finished,
            Ok(Err(err)) => {
                error!(error = %err, "Step loop failed");
                (SessionStatus::Error, err.to_string())
            }
            Err(panic) => {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(reason = %reason, "Step loop panicked");
                (SessionStatus::Error, format!("step loop panicked: {reason}"))
            }
        };

        if let Err(err) = page.close().await {
            warn!(error = %err, "Closing the page failed");
        }
        self.finalize(session, status, message, started)
    }

    /// Stored cookies, then the start URL. Neither failure is fatal.
    async fn initialize(&self, session: &mut Session, page: &dyn PageDriver, start_url: Option<&str>) {
        let cookies = CookieStore::new(&self.paths.cookies_dir).matching(&session.goal, start_url);
        if !cookies.is_empty() {
            match page.set_cookies(&cookies).await {
                Ok(()) => info!(count = cookies.len(), "Loaded stored cookies"),
                Err(err) => warn!(error = %err, "Could not install stored cookies"),
            }
        }

        let Some(raw_url) = start_url else {
            return;
        };
        let url = normalize_url(raw_url);
        let timeout = self.config.navigation_timeout();
        let navigated = match page.goto(&url, timeout).await {
            Ok(()) => page.wait_for_load(timeout).await,
            Err(err) => Err(err),
        };
        match navigated {
            Ok(()) => info!(url = %url, "Opened start URL"),
            Err(err) => {
                warn!(url = %url, error = %err, "Initial navigation failed; continuing on the current page");
                session.memory.observe(format!("Opening {url} failed: {err}"));
            }
        }
    }

    async fn plan(&self, session: &mut Session, start_url: Option<&str>) {
        let plan = GoalPlanner::new(self.model.clone())
            .plan(&session.goal, start_url)
            .await;
        session.memory.working.set_plan(plan.steps.clone());
        if let Some(intent) = &plan.loop_intent {
            session
                .memory
                .working
                .set_loop_target(intent.target, Some(intent.subject.clone()));
        }
        session
            .logger
            .set_plan(&plan.steps, session.memory.working.loop_target);
        session.loop_intent = plan.loop_intent;
    }

    async fn drive(
        &self,
        session: &mut Session,
        page: Arc<dyn PageDriver>,
    ) -> Result<(SessionStatus, String), AgentError> {
        let executor_config = ExecutorConfig {
            screenshot_dir: self.paths.screenshots_dir(),
            ..self.config.executor_config()
        };
        let executor = ActionExecutor::new(page.clone()).with_config(executor_config);
        let verifier = DefaultActionVerifier::new(page.clone())
            .with_settle_delay(Duration::from_millis(self.config.settle_delay_ms));

        for step in 1..=self.config.max_steps {
            session.steps = step;
            let outcome = self
                .step(session, step, page.as_ref(), &executor, &verifier)
                .await?;
            if let StepOutcome::Finished(status, message) = outcome {
                return Ok((status, message));
            }
        }
        let message = format!("Reached maximum steps limit: {}", self.config.max_steps);
        warn!(max_steps = self.config.max_steps, "Step budget exhausted");
        Ok((SessionStatus::MaxStepsReached, message))
    }

    async fn step(
        &self,
        session: &mut Session,
        step: u32,
        page: &dyn PageDriver,
        executor: &ActionExecutor,
        verifier: &dyn ActionVerifier,
    ) -> Result<StepOutcome, AgentError> {
        let snapshot = self.observe(page).await;
        debug!(step, url = %snapshot.url, refs = snapshot.count, source = ?snapshot.source, "Observed page");

        let (decision, model_failed) = self.think(session, &snapshot).await;
        info!(step, action = %decision.kind, valid = decision.is_valid(), "Model decided");

        if !model_failed {
            let current = match page.url().await {
                Ok(current) => current,
                Err(err) => {
                    warn!(step, error = %err, "Could not read the page URL; discarding action");
                    let reason = format!("discarded: could not confirm page URL: {err}");
                    session
                        .logger
                        .record(LoggedAction::unexecuted(step, &decision, false, Some(reason)));
                    session.note(
                        format!("step {step}: could not confirm page URL; re-observing"),
                        self.config.history_limit,
                    );
                    return Ok(StepOutcome::Continue);
                }
            };
            if current != snapshot.url {
                info!(step, from = %snapshot.url, to = %current, "Page changed while deciding; discarding action");
                let reason = format!("discarded: page changed from {} to {current}", snapshot.url);
                session.memory.observe(format!("The page changed to {current} before the action ran"));
                session
                    .logger
                    .record(LoggedAction::unexecuted(step, &decision, false, Some(reason)));
                session.note(format!("step {step}: page changed to {current}; re-observing"), self.config.history_limit);
                return Ok(StepOutcome::Continue);
            }
        }

        let action = match (&decision.action, &decision.error) {
            (Some(action), None) => action.clone(),
            (_, error) => {
                let error = error.clone().unwrap_or_else(|| "decision carried no action".to_string());
                self.reject(session, step, &decision, &snapshot, error);
                return Ok(StepOutcome::Continue);
            }
        };

        if action.is_terminal() {
            return Ok(self.conclude(session, step, &decision, &action, &snapshot));
        }

        if let Err(err) = verifier.capture_state().await {
            debug!(error = %err, "Baseline capture failed; verification will be skipped");
        }
        let result = executor.execute(&action, &snapshot).await;
        let verification = if result.success {
            Some(verifier.verify(action.kind()).await)
        } else {
            None
        };

        let element_name = action
            .element_id()
            .and_then(|id| snapshot.get(id))
            .map(|reference| reference.name.clone())
            .unwrap_or_default();
        let mut record = ActionRecord::new(step as usize, action.kind(), action.summary(), &snapshot.url)
            .with_element_name(&element_name);
        if let Some(err) = &result.error {
            record = record.failed(err.clone());
        }
        if let Some(verdict) = &verification {
            record = record.with_verification(verdict.passed);
        }
        session.memory.record_action(record);

        if self.counts_toward_loop(session, &action, &element_name, result.success, verification.as_ref()) {
            let counter = session.memory.working.increment_loop();
            info!(
                counter,
                target = session.memory.working.loop_target,
                element = %element_name,
                "Loop progress"
            );
        }

        if let Some(verdict) = verification.as_ref().filter(|v| !v.passed) {
            session
                .memory
                .observe(format!("{} had no observable effect: {}", action.summary(), verdict.reason));
        }

        if result.success && action.kind() == ActionKind::Screenshot {
            if let Some(path) = &result.detail {
                session.artifacts.push(PathBuf::from(path));
            }
        }

        if verification.as_ref().is_some_and(|v| v.delta.url_changed) {
            let url = page.url().await.unwrap_or_default();
            session.memory.observe(format!("Navigated to {url}"));
            if session.memory.working.advance_step() {
                debug!(step_index = session.memory.working.step_index, "Advanced plan step");
            }
        }

        let status = match (&result.error, &verification) {
            (Some(err), _) => format!("FAILED: {err}"),
            (None, Some(v)) if !v.passed => format!("no effect ({})", v.reason),
            _ => "ok".to_string(),
        };
        session.note(format!("step {step}: {} -> {status}", action.summary()), self.config.history_limit);
        session
            .logger
            .record(LoggedAction::executed(step, &decision, &result, verification));
        Ok(StepOutcome::Continue)
    }

    /// Accessibility snapshot first, DOM when the tree is unavailable or has no refs.
    async fn observe(&self, page: &dyn PageDriver) -> PageSnapshot {
        let options = SnapshotOptions {
            char_budget: self.config.snapshot_char_budget,
        };
        let ax = AccessibilitySnapshotBuilder::new(options.clone()).build(page).await;
        if !ax.is_error() && !ax.is_empty() {
            return ax;
        }
        let dom = DomSnapshotBuilder::new(options).build(page).await;
        if dom.is_error() || (dom.is_empty() && !ax.is_error()) {
            ax
        } else {
            dom
        }
    }

    /// Ask the model. The flag is set when the request itself failed.
    async fn think(&self, session: &Session, snapshot: &PageSnapshot) -> (Decision, bool) {
        let memory = session.memory.context();
        let history: Vec<String> = session.history.iter().cloned().collect();
        let prompt = self.prompts.decision_prompt(&PromptContext {
            goal: &session.goal,
            url: &snapshot.url,
            snapshot,
            memory: &memory,
            history: &history,
        });
        let request = CompletionRequest::new(prompt).with_system(self.prompts.system_prompt());

        async {
            match self.model.complete(&request).await {
                Ok(raw) => {
                    debug!(chars = raw.len(), "Model responded");
                    (parse_decision(&raw, snapshot), false)
                }
                Err(err) => {
                    warn!(model = %self.model.name(), error = %err, "Model request failed; terminating");
                    (Decision::terminate(err.to_string()), true)
                }
            }
        }
        .instrument(LogCategory::Llm.span("decision"))
        .await
    }

    fn reject(&self, session: &mut Session, step: u32, decision: &Decision, snapshot: &PageSnapshot, error: String) {
        warn!(step, action = %decision.kind, error = %error, "Rejected invalid decision");
        let summary = decision
            .action
            .as_ref()
            .map(Action::summary)
            .unwrap_or_else(|| decision.kind.name().to_string());
        session.memory.record_action(
            ActionRecord::new(step as usize, decision.kind, summary.clone(), &snapshot.url).failed(error.clone()),
        );
        session.note(format!("step {step}: {summary} -> invalid: {error}"), self.config.history_limit);
        session
            .logger
            .record(LoggedAction::unexecuted(step, decision, false, Some(error)));
    }

    /// Handle `extract`, `complete` and `terminate`.
    fn conclude(
        &self,
        session: &mut Session,
        step: u32,
        decision: &Decision,
        action: &Action,
        snapshot: &PageSnapshot,
    ) -> StepOutcome {
        match action {
            Action::Terminate { reason } => {
                info!(step, reason = %reason, "Session terminated by decision");
                session
                    .logger
                    .record(LoggedAction::unexecuted(step, decision, true, None));
                StepOutcome::Finished(SessionStatus::Terminated, reason.clone())
            }
            Action::Extract {
                extracted_data,
                output_format,
                output_title,
            } => {
                self.export(session, extracted_data, *output_format, output_title.as_deref());
                session.memory.record_action(ActionRecord::new(
                    step as usize,
                    ActionKind::Extract,
                    action.summary(),
                    &snapshot.url,
                ));
                session
                    .logger
                    .record(LoggedAction::unexecuted(step, decision, true, None));
                if session.memory.working.loop_satisfied() {
                    StepOutcome::Finished(SessionStatus::Completed, completion_message(decision))
                } else {
                    session.note(
                        format!("step {step}: extract -> saved; loop target not reached yet"),
                        self.config.history_limit,
                    );
                    StepOutcome::Continue
                }
            }
            Action::Complete {
                extracted_data,
                output_format,
                output_title,
            } => {
                let working = &session.memory.working;
                if !working.loop_satisfied() {
                    let progress = format!(
                        "{}/{}",
                        working.loop_counter,
                        working.loop_target.unwrap_or_default()
                    );
                    info!(step, progress = %progress, "Completion deferred until the loop target is reached");
                    session.memory.observe(format!(
                        "Completion requested at {progress}; keep going until the target is reached"
                    ));
                    session.logger.record(LoggedAction::unexecuted(
                        step,
                        decision,
                        false,
                        Some("deferred: loop target not reached".to_string()),
                    ));
                    session.note(
                        format!("step {step}: complete -> deferred ({progress})"),
                        self.config.history_limit,
                    );
                    return StepOutcome::Continue;
                }
                if let Some(data) = extracted_data {
                    self.export(session, data, *output_format, output_title.as_deref());
                }
                session
                    .logger
                    .record(LoggedAction::unexecuted(step, decision, true, None));
                info!(step, "Goal completed");
                StepOutcome::Finished(SessionStatus::Completed, completion_message(decision))
            }
            other => {
                debug!(action = %other.kind(), "Non-terminal action reached conclude");
                StepOutcome::Continue
            }
        }
    }

    fn export(&self, session: &mut Session, data: &Value, format: OutputFormat, title: Option<&str>) {
        if data.is_null() {
            return;
        }
        session.extracted = Some(data.clone());
        match Exporter::new(&self.paths.output_dir).export(data, format, title) {
            Ok(path) => {
                session
                    .memory
                    .remember_fact("last_export", path.display().to_string());
                session.artifacts.push(path);
            }
            Err(err) => {
                warn!(error = %err, "Export failed");
                session.memory.observe(format!("Saving the extracted data failed: {err}"));
            }
        }
    }

    fn counts_toward_loop(
        &self,
        session: &Session,
        action: &Action,
        element_name: &str,
        success: bool,
        verification: Option<&VerificationResult>,
    ) -> bool {
        if session.memory.working.loop_target.is_none() || !matches!(action, Action::Click { .. }) {
            return false;
        }
        if !success || !verification.map(|v| v.passed).unwrap_or(false) {
            return false;
        }
        let name = element_name.to_lowercase();
        let goal_terms = session
            .loop_intent
            .as_ref()
            .map(LoopIntent::qualifying_terms)
            .unwrap_or_default();
        self.config
            .loop_terms
            .iter()
            .map(|term| term.to_lowercase())
            .chain(goal_terms)
            .any(|term| !term.is_empty() && name.contains(&term))
    }

    fn finalize(&self, mut session: Session, status: SessionStatus, message: String, started: Instant) -> SessionOutcome {
        let working = &session.memory.working;
        let loop_counter = working.loop_counter;
        let loop_target = working.loop_target;
        let facts: BTreeMap<String, String> = session
            .memory
            .facts()
            .into_iter()
            .map(|fact| (fact.key.clone(), fact.value.clone()))
            .collect();

        session.logger.finish(
            status,
            SessionClose {
                error: (status != SessionStatus::Completed).then(|| message.clone()),
                loop_counter,
                loop_target,
                facts,
                artifacts: session.artifacts.clone(),
            },
        );
        let log_path = match session.logger.save() {
            Ok(path) => Some(path),
            Err(err) => {
                warn!(error = %err, "Could not save the action log");
                None
            }
        };

        let outcome = SessionOutcome {
            session_id: session.logger.session_id().to_string(),
            status,
            message,
            steps: session.steps,
            duration_ms: started.elapsed().as_millis() as u64,
            log_path,
            artifacts: session.artifacts,
            loop_counter,
            loop_target,
            extracted_data: session.extracted,
        };
        info!(
            session = %outcome.session_id,
            status = %outcome.status,
            steps = outcome.steps,
            duration_ms = outcome.duration_ms,
            "Session finished"
        );
        outcome
    }
}

fn completion_message(decision: &Decision) -> String {
    if decision.reasoning.trim().is_empty() {
        "Goal completed".to_string()
    } else {
        decision.reasoning.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_removes_pacing() {
        let executor = AgentConfig::minimal().executor_config();
        assert_eq!(executor.settle_delay, Duration::ZERO);
        assert_eq!(executor.click_retry_delay, Duration::ZERO);
        assert_eq!(executor.max_wait_secs, 0.0);
        assert_eq!(executor.navigation_timeout, Duration::from_secs(60));
    }

    #[test]
    fn agent_config_fills_missing_fields_from_defaults() {
        let config: AgentConfig = serde_json::from_str(r#"{"max_steps": 5}"#).expect("config");
        assert_eq!(config.max_steps, 5);
        assert_eq!(config.loop_terms, vec!["apply", "submit"]);
        assert_eq!(config.history_limit, 5);
    }
}
