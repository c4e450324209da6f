use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surfpilot_core_types::ActionKind;

/// One executed action as the agent remembers it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub step: usize,
    pub action: ActionKind,
    /// Single-line rendering, e.g. `click [e4]`.
    pub summary: String,
    /// Accessible name of the targeted element, when there was one.
    #[serde(default)]
    pub element_name: Option<String>,
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    /// Verifier verdict, when the action was verified.
    #[serde(default)]
    pub verified: Option<bool>,
    pub url: String,
    pub timestamp: DateTime<Utc>,
}

impl ActionRecord {
    pub fn new(step: usize, action: ActionKind, summary: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            step,
            action,
            summary: summary.into(),
            element_name: None,
            success: true,
            error: None,
            verified: None,
            url: url.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_element_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !name.trim().is_empty() {
            self.element_name = Some(name);
        }
        self
    }

    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.success = false;
        self.error = Some(error.into());
        self
    }

    pub fn with_verification(mut self, passed: bool) -> Self {
        self.verified = Some(passed);
        self
    }

    /// Did the action both run and have its expected effect.
    pub fn effective(&self) -> bool {
        self.success && self.verified.unwrap_or(true)
    }

    pub(crate) fn render(&self) -> String {
        let mut line = format!("step {}: {}", self.step, self.summary);
        if let Some(name) = &self.element_name {
            line.push_str(&format!(" \"{}\"", clip(name, 40)));
        }
        if !self.success {
            let error = self.error.as_deref().unwrap_or("unknown error");
            line.push_str(&format!(" -> FAILED: {}", clip(error, 120)));
        } else if self.verified == Some(false) {
            line.push_str(" -> ran, but no effect observed");
        } else {
            line.push_str(" -> ok");
        }
        line
    }
}

/// Long-term fact. Facts are never overwritten: a newer entry for a key shadows older ones.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    pub key: String,
    pub value: String,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub note: String,
    pub recorded_at: DateTime<Utc>,
}

pub(crate) fn clip(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        value.to_string()
    } else {
        let mut out: String = value.chars().take(max).collect();
        out.push_str("...");
        out
    }
}
