//! Core types for action primitives

use std::path::PathBuf;
use std::time::Duration;

use action_locator::{LocatorStrategy, Resolution};
use chrono::{DateTime, Utc};
use perceiver_structural::LocatorHints;
use serde::{Deserialize, Serialize};
use surfpilot_core_types::ActionKind;

/// Timing knobs for the executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Bound on each click attempt and other element operations.
    pub action_timeout: Duration,
    pub navigation_timeout: Duration,
    /// Pause between rungs of the click ladder.
    pub click_retry_delay: Duration,
    /// Wait after a submitting keystroke.
    pub settle_delay: Duration,
    /// Wait after a scroll for smooth-scroll animation.
    pub scroll_settle: Duration,
    pub type_delay_min_ms: u64,
    pub type_delay_max_ms: u64,
    /// Upper bound for a model-requested `wait`.
    pub max_wait_secs: f64,
    /// Where `screenshot` writes its PNG files.
    pub screenshot_dir: PathBuf,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            action_timeout: Duration::from_secs(5),
            navigation_timeout: Duration::from_secs(60),
            click_retry_delay: Duration::from_millis(500),
            settle_delay: Duration::from_millis(1000),
            scroll_settle: Duration::from_millis(300),
            type_delay_min_ms: 30,
            type_delay_max_ms: 80,
            max_wait_secs: 30.0,
            screenshot_dir: PathBuf::from("./output/screenshots"),
        }
    }
}

impl ExecutorConfig {
    /// No pauses at all. Used where wall-clock pacing does not matter.
    pub fn immediate() -> Self {
        Self {
            click_retry_delay: Duration::ZERO,
            settle_delay: Duration::ZERO,
            scroll_settle: Duration::ZERO,
            type_delay_min_ms: 0,
            type_delay_max_ms: 0,
            ..Self::default()
        }
    }
}

/// The element an action was aimed at, as recorded in the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementTarget {
    pub ref_id: String,
    pub hints: LocatorHints,
}

/// Details of a primitive that finished without error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionReport {
    pub attempts: u32,
    pub strategy: Option<LocatorStrategy>,
    pub detail: Option<String>,
}

impl ActionReport {
    pub fn new() -> Self {
        Self {
            attempts: 1,
            ..Self::default()
        }
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn resolved_by(mut self, resolution: &Resolution) -> Self {
        self.strategy = Some(resolution.strategy);
        self
    }
}

/// Outcome of executing one action. Element failures land here instead of in an `Err`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub action: ActionKind,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<LocatorStrategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<ElementTarget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub started_at: DateTime<Utc>,
    pub latency_ms: u64,
}

impl ActionResult {
    pub fn success(
        action: ActionKind,
        report: ActionReport,
        started_at: DateTime<Utc>,
        latency_ms: u64,
    ) -> Self {
        Self {
            action,
            success: true,
            error: None,
            attempts: report.attempts,
            strategy: report.strategy,
            target: None,
            detail: report.detail,
            started_at,
            latency_ms,
        }
    }

    pub fn failure(
        action: ActionKind,
        error: impl Into<String>,
        attempts: u32,
        started_at: DateTime<Utc>,
        latency_ms: u64,
    ) -> Self {
        Self {
            action,
            success: false,
            error: Some(error.into()),
            attempts,
            strategy: None,
            target: None,
            detail: None,
            started_at,
            latency_ms,
        }
    }

    pub fn with_target(mut self, target: Option<ElementTarget>) -> Self {
        self.target = target;
        self
    }
}
