//! Before/after state verifier

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cdp_adapter::PageDriver;
use chrono::Utc;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use surfpilot_core_types::{ActionKind, LogCategory};
use tracing::{debug, info, warn, Instrument};

use crate::{
    errors::GateError,
    types::{PageState, VerificationResult, CONTENT_HASH_CHARS},
};

/// Judges whether an action had the effect its type implies.
#[async_trait]
pub trait ActionVerifier: Send + Sync {
    /// Record the baseline the next [`ActionVerifier::verify`] compares against.
    async fn capture_state(&self) -> Result<PageState, GateError>;

    /// Wait for the page to settle, re-capture and judge. Never fails: capture problems
    /// produce a passing, unverified result with the reason.
    async fn verify(&self, action: ActionKind) -> VerificationResult;
}

pub struct DefaultActionVerifier {
    page: Arc<dyn PageDriver>,
    settle_delay: Duration,
    baseline: Mutex<Option<PageState>>,
}

impl DefaultActionVerifier {
    pub fn new(page: Arc<dyn PageDriver>) -> Self {
        Self {
            page,
            settle_delay: Duration::from_millis(1000),
            baseline: Mutex::new(None),
        }
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    async fn observe(&self) -> Result<PageState, GateError> {
        let url = self.page.url().await?;
        let interactive_count = self.page.count_interactive().await?;
        let text = self.page.visible_text().await?;
        Ok(PageState {
            url,
            interactive_count,
            content_hash: content_hash(&text),
            captured_at: Utc::now(),
        })
    }
}

/// Hex SHA-256 over the first [`CONTENT_HASH_CHARS`] characters.
pub fn content_hash(text: &str) -> String {
    let leading: String = text.chars().take(CONTENT_HASH_CHARS).collect();
    let mut hasher = Sha256::new();
    hasher.update(leading.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl ActionVerifier for DefaultActionVerifier {
    async fn capture_state(&self) -> Result<PageState, GateError> {
        let observed = self.observe().await;
        match &observed {
            Ok(state) => {
                debug!(url = %state.url, count = state.interactive_count, "Captured baseline");
                *self.baseline.lock() = Some(state.clone());
            }
            Err(err) => {
                warn!(error = %err, "Baseline capture failed");
                *self.baseline.lock() = None;
            }
        }
        observed
    }

    async fn verify(&self, action: ActionKind) -> VerificationResult {
        let span = LogCategory::Browser.span("verifier");
        async {
            let Some(before) = self.baseline.lock().take() else {
                return VerificationResult::unverified(action, GateError::NoBaseline.to_string());
            };

            if !self.settle_delay.is_zero() {
                tokio::time::sleep(self.settle_delay).await;
            }

            let after = match self.observe().await {
                Ok(after) => after,
                Err(err) => {
                    warn!(action = %action, error = %err, "Post-action capture failed");
                    return VerificationResult::unverified(action, err.to_string());
                }
            };

            let result = VerificationResult::judge(action, before, after);
            info!(
                action = %action,
                passed = result.passed,
                url_changed = result.delta.url_changed,
                count_delta = result.delta.count_delta,
                content_changed = result.delta.content_changed,
                "Verification complete"
            );
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_only_covers_leading_text() {
        let head = "a".repeat(CONTENT_HASH_CHARS);
        assert_eq!(content_hash(&format!("{head}tail one")), content_hash(&format!("{head}tail two")));
        assert_ne!(content_hash("first"), content_hash("second"));
        assert_eq!(content_hash("").len(), 64);
    }
}
