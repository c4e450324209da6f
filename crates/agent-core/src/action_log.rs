//! Per-session action log.
//!
//! Steps are appended in memory while the session runs and the whole document is written
//! to `<logs_dir>/<session_id>.json` when the session finishes. The same document drives
//! `sessions` listings and replay.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use action_gate::VerificationResult;
use action_primitives::{ActionResult, ElementTarget};
use chrono::{DateTime, Utc};
use perceiver_structural::LocatorHints;
use serde::{Deserialize, Serialize};
use surfpilot_core_types::{Action, ActionKind, Decision, SessionId};
use tracing::{debug, info, warn};

use crate::errors::AgentError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Running,
    Completed,
    Terminated,
    Error,
    MaxStepsReached,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Running => "running",
            SessionStatus::Completed => "completed",
            SessionStatus::Terminated => "terminated",
            SessionStatus::Error => "error",
            SessionStatus::MaxStepsReached => "max_steps_reached",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logged step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedAction {
    pub step: u32,
    pub timestamp: DateTime<Utc>,
    pub action_type: ActionKind,
    /// Canonical action; absent when the model's output could not be turned into one.
    #[serde(default)]
    pub action: Option<Action>,
    #[serde(default)]
    pub reasoning: String,
    pub success: bool,
    /// The action reached the page. Replay skips everything else.
    #[serde(default)]
    pub executed: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub latency_ms: u64,
    #[serde(default)]
    pub verification: Option<VerificationResult>,
    /// Snapshot reference the action targeted.
    #[serde(default)]
    pub element_ref: Option<String>,
    /// Locator hints of the resolved element, used by replay.
    #[serde(default)]
    pub element: Option<LocatorHints>,
}

impl LoggedAction {
    /// Entry for a decision that reached the executor.
    pub fn executed(
        step: u32,
        decision: &Decision,
        result: &ActionResult,
        verification: Option<VerificationResult>,
    ) -> Self {
        Self {
            step,
            timestamp: result.started_at,
            action_type: result.action,
            action: decision.action.clone(),
            reasoning: decision.reasoning.clone(),
            success: result.success,
            executed: true,
            error: result.error.clone(),
            attempts: result.attempts,
            latency_ms: result.latency_ms,
            verification,
            element_ref: result.target.as_ref().map(|target| target.ref_id.clone()),
            element: result.target.as_ref().map(|target| target.hints.clone()),
        }
    }

    /// Entry for a decision that was not executed (invalid, deferred or terminal).
    pub fn unexecuted(step: u32, decision: &Decision, success: bool, error: Option<String>) -> Self {
        Self {
            step,
            timestamp: Utc::now(),
            action_type: decision.kind,
            action: decision.action.clone(),
            reasoning: decision.reasoning.clone(),
            success,
            executed: false,
            error,
            attempts: 0,
            latency_ms: 0,
            verification: None,
            element_ref: None,
            element: None,
        }
    }

    /// Recorded element target, in the form the executor accepts.
    pub fn target(&self) -> Option<ElementTarget> {
        match (&self.element_ref, &self.element) {
            (Some(ref_id), Some(hints)) => Some(ElementTarget {
                ref_id: ref_id.clone(),
                hints: hints.clone(),
            }),
            _ => None,
        }
    }
}

/// The persisted session document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionLog {
    pub session_id: String,
    pub goal: String,
    #[serde(default)]
    pub start_url: Option<String>,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_seconds: f64,
    pub status: SessionStatus,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub loop_counter: u32,
    #[serde(default)]
    pub loop_target: Option<u32>,
    #[serde(default)]
    pub plan: Vec<String>,
    #[serde(default)]
    pub facts: BTreeMap<String, String>,
    #[serde(default)]
    pub action_count: usize,
    #[serde(default)]
    pub artifacts: Vec<PathBuf>,
    #[serde(default)]
    pub actions: Vec<LoggedAction>,
}

/// Listing entry for `sessions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub goal: String,
    pub status: SessionStatus,
    pub start_time: DateTime<Utc>,
    pub action_count: usize,
}

/// How a session ended, as recorded by [`ActionLogger::finish`].
#[derive(Debug, Clone, Default)]
pub struct SessionClose {
    pub error: Option<String>,
    pub loop_counter: u32,
    pub loop_target: Option<u32>,
    pub facts: BTreeMap<String, String>,
    pub artifacts: Vec<PathBuf>,
}

pub struct ActionLogger {
    logs_dir: PathBuf,
    log: SessionLog,
}

impl ActionLogger {
    pub fn start(
        logs_dir: impl Into<PathBuf>,
        session_id: &SessionId,
        goal: impl Into<String>,
        start_url: Option<&str>,
    ) -> Self {
        let log = SessionLog {
            session_id: session_id.to_string(),
            goal: goal.into(),
            start_url: start_url.map(str::to_string),
            start_time: Utc::now(),
            end_time: None,
            duration_seconds: 0.0,
            status: SessionStatus::Running,
            success: false,
            error: None,
            loop_counter: 0,
            loop_target: None,
            plan: Vec::new(),
            facts: BTreeMap::new(),
            action_count: 0,
            artifacts: Vec::new(),
            actions: Vec::new(),
        };
        debug!(session = %log.session_id, "Action log started");
        Self {
            logs_dir: logs_dir.into(),
            log,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.log.session_id
    }

    pub fn log(&self) -> &SessionLog {
        &self.log
    }

    pub fn set_plan(&mut self, plan: &[String], loop_target: Option<u32>) {
        self.log.plan = plan.to_vec();
        self.log.loop_target = loop_target;
    }

    pub fn record(&mut self, entry: LoggedAction) {
        self.log.actions.push(entry);
        self.log.action_count = self.log.actions.len();
    }

    pub fn finish(&mut self, status: SessionStatus, close: SessionClose) {
        let end = Utc::now();
        self.log.end_time = Some(end);
        self.log.duration_seconds =
            (end - self.log.start_time).num_milliseconds().max(0) as f64 / 1000.0;
        self.log.status = status;
        self.log.success = status == SessionStatus::Completed;
        self.log.error = close.error;
        self.log.loop_counter = close.loop_counter;
        if close.loop_target.is_some() {
            self.log.loop_target = close.loop_target;
        }
        self.log.facts = close.facts;
        self.log.artifacts = close.artifacts;
        self.log.action_count = self.log.actions.len();
    }

    /// Write the document and return its path.
    pub fn save(&self) -> Result<PathBuf, AgentError> {
        fs::create_dir_all(&self.logs_dir)?;
        let path = log_path(&self.logs_dir, &self.log.session_id);
        fs::write(&path, serde_json::to_string_pretty(&self.log)?)?;
        info!(path = %path.display(), actions = self.log.action_count, "Action log saved");
        Ok(path)
    }
}

pub fn log_path(logs_dir: &Path, session_id: &str) -> PathBuf {
    logs_dir.join(format!("{session_id}.json"))
}

pub fn load_session(logs_dir: &Path, session_id: &str) -> Result<SessionLog, AgentError> {
    let path = log_path(logs_dir, session_id);
    if !path.exists() {
        return Err(AgentError::session_not_found(session_id));
    }
    let raw = fs::read_to_string(&path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Summaries of every readable log, newest first. A missing directory lists nothing.
pub fn list_sessions(logs_dir: &Path) -> Result<Vec<SessionSummary>, AgentError> {
    if !logs_dir.exists() {
        return Ok(Vec::new());
    }
    let mut sessions = Vec::new();
    for entry in fs::read_dir(logs_dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let parsed = fs::read_to_string(&path)
            .map_err(AgentError::from)
            .and_then(|raw| serde_json::from_str::<SessionLog>(&raw).map_err(AgentError::from));
        match parsed {
            Ok(log) => sessions.push(SessionSummary {
                session_id: log.session_id,
                goal: log.goal,
                status: log.status,
                start_time: log.start_time,
                action_count: log.action_count,
            }),
            Err(err) => warn!(file = %path.display(), error = %err, "Skipping unreadable session log"),
        }
    }
    sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time));
    Ok(sessions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn decision() -> Decision {
        Decision::valid(Action::Reload, "refresh the page")
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let id = SessionId::new();
        let mut logger = ActionLogger::start(dir.path(), &id, "refresh twice", Some("https://example.com"));
        logger.set_plan(&["reload".to_string()], Some(2));
        logger.record(LoggedAction::unexecuted(1, &decision(), true, None));
        logger.finish(
            SessionStatus::Completed,
            SessionClose {
                loop_counter: 2,
                ..SessionClose::default()
            },
        );
        let path = logger.save().expect("save");
        assert_eq!(path, dir.path().join(format!("{id}.json")));

        let loaded = load_session(dir.path(), id.as_str()).expect("load");
        assert_eq!(loaded.status, SessionStatus::Completed);
        assert!(loaded.success);
        assert_eq!(loaded.loop_counter, 2);
        assert_eq!(loaded.loop_target, Some(2));
        assert_eq!(loaded.action_count, 1);
        assert_eq!(loaded.actions[0].action, Some(Action::Reload));
        assert!(loaded.end_time.is_some());
    }

    #[test]
    fn missing_session_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_session(dir.path(), "session_deadbeef").expect_err("missing");
        assert!(matches!(err, AgentError::SessionNotFound(_)));
    }

    #[test]
    fn listing_is_newest_first_and_skips_junk() {
        let dir = tempfile::tempdir().expect("tempdir");
        for (goal, age) in [("older", 10), ("newer", 1)] {
            let mut logger = ActionLogger::start(dir.path(), &SessionId::new(), goal, None);
            logger.log.start_time = Utc::now() - Duration::minutes(age);
            logger.finish(SessionStatus::Terminated, SessionClose::default());
            logger.save().expect("save");
        }
        fs::write(dir.path().join("broken.json"), "{not json").expect("write");
        fs::write(dir.path().join("notes.txt"), "ignore me").expect("write");

        let sessions = list_sessions(dir.path()).expect("list");
        let goals: Vec<_> = sessions.iter().map(|s| s.goal.as_str()).collect();
        assert_eq!(goals, vec!["newer", "older"]);
    }

    #[test]
    fn listing_a_missing_directory_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(list_sessions(&dir.path().join("nope")).expect("list").is_empty());
    }
}
