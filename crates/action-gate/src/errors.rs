//! Error types for the verification gate

use cdp_adapter::AdapterError;
use thiserror::Error;

/// Failure while observing the page. Never leaves the verifier: it degrades the
/// [`crate::VerificationResult`] instead.
#[derive(Debug, Error, Clone)]
pub enum GateError {
    #[error("failed to capture page state: {0}")]
    Capture(#[from] AdapterError),

    #[error("no baseline state was captured before the action")]
    NoBaseline,
}

impl GateError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, GateError::Capture(err) if err.is_timeout())
    }
}
