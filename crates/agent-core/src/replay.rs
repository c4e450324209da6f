//! Re-execute a recorded session without the model.

use std::path::Path;
use std::time::Duration;

use action_primitives::{normalize_url, ActionExecutor, ActionResult};
use serde::{Deserialize, Serialize};
use surfpilot_core_types::{Action, LogCategory};
use tracing::{info, warn, Instrument};

use crate::action_log::{load_session, SessionLog};
use crate::errors::AgentError;

const STEP_PAUSE_SECS: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReplayOptions {
    /// Playback speed multiplier; waits and pauses are divided by it.
    pub speed: f64,
    pub continue_on_error: bool,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            speed: 1.0,
            continue_on_error: false,
        }
    }
}

impl ReplayOptions {
    fn effective_speed(&self) -> f64 {
        if self.speed.is_finite() && self.speed > 0.0 {
            self.speed
        } else {
            1.0
        }
    }

    fn scaled(&self, seconds: f64) -> Duration {
        Duration::from_secs_f64((seconds / self.effective_speed()).max(0.0))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayReport {
    pub session_id: String,
    /// Replayable entries in the log.
    pub total: usize,
    pub succeeded: usize,
    pub results: Vec<ActionResult>,
}

impl ReplayReport {
    pub fn all_succeeded(&self) -> bool {
        self.succeeded == self.total
    }
}

pub struct Replayer {
    executor: ActionExecutor,
}

impl Replayer {
    pub fn new(executor: ActionExecutor) -> Self {
        Self { executor }
    }

    /// Replay every executed non-terminal action in order, stopping at the first failure
    /// unless `continue_on_error` is set. Discarded, rejected and deferred steps are skipped.
    pub async fn replay(&self, log: &SessionLog, options: ReplayOptions) -> Result<ReplayReport, AgentError> {
        async {
            if let Some(start_url) = log.start_url.as_deref() {
                let url = normalize_url(start_url);
                let timeout = self.executor.config().navigation_timeout;
                self.executor.page().goto(&url, timeout).await?;
            }

            let entries: Vec<_> = log
                .actions
                .iter()
                .filter(|entry| entry.executed)
                .filter_map(|entry| entry.action.as_ref().map(|action| (entry, action)))
                .filter(|(_, action)| !action.is_terminal())
                .collect();
            info!(session = %log.session_id, actions = entries.len(), speed = options.effective_speed(), "Replaying session");

            let mut report = ReplayReport {
                session_id: log.session_id.clone(),
                total: entries.len(),
                succeeded: 0,
                results: Vec::with_capacity(entries.len()),
            };

            for (index, (entry, action)) in entries.iter().enumerate() {
                if index > 0 {
                    tokio::time::sleep(options.scaled(STEP_PAUSE_SECS)).await;
                }
                let result = match action {
                    Action::Wait { seconds } => {
                        let scaled = Action::Wait {
                            seconds: seconds / options.effective_speed(),
                        };
                        self.executor.execute_on(&scaled, None).await
                    }
                    _ => self.executor.execute_on(action, entry.target()).await,
                };
                let success = result.success;
                if success {
                    report.succeeded += 1;
                } else {
                    warn!(step = entry.step, action = %action.summary(), error = ?result.error, "Replayed action failed");
                }
                report.results.push(result);
                if !success && !options.continue_on_error {
                    break;
                }
            }

            info!(succeeded = report.succeeded, total = report.total, "Replay finished");
            Ok(report)
        }
        .instrument(LogCategory::Workflow.span("replay"))
        .await
    }
}

/// Load `session_id` from `logs_dir` and replay it.
pub async fn replay_session(
    logs_dir: &Path,
    session_id: &str,
    executor: ActionExecutor,
    options: ReplayOptions,
) -> Result<ReplayReport, AgentError> {
    let log = load_session(logs_dir, session_id)?;
    Replayer::new(executor).replay(&log, options).await
}
