//! Core types for the verification gate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surfpilot_core_types::ActionKind;

/// Characters of visible text folded into the content hash.
pub const CONTENT_HASH_CHARS: usize = 5000;

/// Cheap fingerprint of the page at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageState {
    pub url: String,
    pub interactive_count: usize,
    /// Hex SHA-256 of the leading visible text.
    pub content_hash: String,
    pub captured_at: DateTime<Utc>,
}

/// How an action's effect is judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationRule {
    /// Fails only if URL, element count and content are all unchanged.
    AnyChange,
    /// Fails only if the URL did not change.
    UrlChange,
    /// Always passes. Deltas are still reported.
    Optimistic,
}

impl VerificationRule {
    pub fn for_action(kind: ActionKind) -> Self {
        match kind {
            ActionKind::Click | ActionKind::ClickXy => VerificationRule::AnyChange,
            ActionKind::GotoUrl | ActionKind::GoBack | ActionKind::GoForward => {
                VerificationRule::UrlChange
            }
            _ => VerificationRule::Optimistic,
        }
    }
}

/// Differences between two captured states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDelta {
    pub url_changed: bool,
    pub count_delta: i64,
    pub content_changed: bool,
}

impl StateDelta {
    pub fn between(before: &PageState, after: &PageState) -> Self {
        Self {
            url_changed: before.url != after.url,
            count_delta: after.interactive_count as i64 - before.interactive_count as i64,
            content_changed: before.content_hash != after.content_hash,
        }
    }

    pub fn anything_changed(&self) -> bool {
        self.url_changed || self.count_delta != 0 || self.content_changed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub action: ActionKind,
    pub rule: VerificationRule,
    pub passed: bool,
    #[serde(flatten)]
    pub delta: StateDelta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<PageState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<PageState>,
    pub reason: String,
}

impl VerificationResult {
    /// Judge `delta` under the rule for `action`.
    pub fn judge(action: ActionKind, before: PageState, after: PageState) -> Self {
        let rule = VerificationRule::for_action(action);
        let delta = StateDelta::between(&before, &after);
        let (passed, reason) = match rule {
            VerificationRule::AnyChange if !delta.anything_changed() => {
                (false, "no observable change after click".to_string())
            }
            VerificationRule::UrlChange if !delta.url_changed => {
                (false, format!("url is still {}", after.url))
            }
            _ => (true, describe(&delta)),
        };
        Self {
            action,
            rule,
            passed,
            delta,
            before: Some(before),
            after: Some(after),
            reason,
        }
    }

    /// Passing verdict when there was nothing to compare against.
    pub fn unverified(action: ActionKind, reason: impl Into<String>) -> Self {
        Self {
            action,
            rule: VerificationRule::for_action(action),
            passed: true,
            delta: StateDelta::default(),
            before: None,
            after: None,
            reason: reason.into(),
        }
    }
}

fn describe(delta: &StateDelta) -> String {
    if !delta.anything_changed() {
        return "no change observed".to_string();
    }
    let mut parts = Vec::new();
    if delta.url_changed {
        parts.push("url changed".to_string());
    }
    if delta.count_delta != 0 {
        parts.push(format!("interactive elements {:+}", delta.count_delta));
    }
    if delta.content_changed {
        parts.push("content changed".to_string());
    }
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(url: &str, count: usize, hash: &str) -> PageState {
        PageState {
            url: url.into(),
            interactive_count: count,
            content_hash: hash.into(),
            captured_at: Utc::now(),
        }
    }

    #[test]
    fn click_fails_only_when_nothing_changed() {
        let before = state("https://a", 10, "x");
        let same = VerificationResult::judge(ActionKind::Click, before.clone(), state("https://a", 10, "x"));
        assert!(!same.passed);

        let grew = VerificationResult::judge(ActionKind::Click, before, state("https://a", 12, "x"));
        assert!(grew.passed);
        assert_eq!(grew.delta.count_delta, 2);
        assert_eq!(grew.reason, "interactive elements +2");
    }

    #[test]
    fn navigation_needs_a_url_change() {
        let before = state("https://a", 10, "x");
        let stuck = VerificationResult::judge(ActionKind::GotoUrl, before.clone(), state("https://a", 3, "y"));
        assert!(!stuck.passed);
        assert!(stuck.delta.content_changed);

        let moved = VerificationResult::judge(ActionKind::GoBack, before, state("https://b", 10, "x"));
        assert!(moved.passed);
    }

    #[test]
    fn input_and_scroll_pass_but_report_deltas() {
        let before = state("https://a", 10, "x");
        let input = VerificationResult::judge(ActionKind::InputText, before.clone(), before.clone());
        assert!(input.passed);
        assert_eq!(input.reason, "no change observed");

        let scroll = VerificationResult::judge(ActionKind::Scroll, before, state("https://a", 14, "z"));
        assert!(scroll.passed);
        assert_eq!(scroll.delta.count_delta, 4);
    }
}
