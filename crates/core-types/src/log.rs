//! Log categories carried on component spans.

use serde::{Deserialize, Serialize};
use tracing::Span;

/// Coarse category attached to every component's tracing span.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogCategory {
    /// Orchestration, planning and memory bookkeeping.
    Workflow,
    /// Model requests and response parsing.
    Llm,
    /// Page driving, snapshots, location and verification.
    Browser,
}

impl LogCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            LogCategory::Workflow => "workflow",
            LogCategory::Llm => "llm",
            LogCategory::Browser => "browser",
        }
    }

    /// Span a component enters (via `Instrument`) before emitting events.
    pub fn span(self, component: &'static str) -> Span {
        tracing::info_span!("surfpilot", category = self.as_str(), component)
    }
}
