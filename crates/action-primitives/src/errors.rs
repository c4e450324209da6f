//! Error types for action primitives

use action_locator::LocatorError;
use cdp_adapter::{AdapterError, AdapterErrorKind};
use thiserror::Error;

/// Failure of a single primitive. Surfaced to callers only as the `error` text of an
/// [`crate::ActionResult`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ActionError {
    /// Navigation timed out waiting for page load
    #[error("Navigation timeout: {0}")]
    NavTimeout(String),

    /// A bounded page operation ran out of time
    #[error("Wait timeout: {0}")]
    WaitTimeout(String),

    /// Element is not clickable (obscured, detached, or not interactable)
    #[error("Element not clickable: {0}")]
    NotClickable(String),

    /// Every rung of the click ladder failed
    #[error("Click failed after {attempts} attempts: {last}")]
    ClickExhausted { attempts: u32, last: String },

    /// Dropdown option was not found
    #[error("Option not found in dropdown: {0}")]
    OptionNotFound(String),

    /// No live element matched the reference
    #[error("Anchor not found: {0}")]
    AnchorNotFound(String),

    /// The reference is not part of the snapshot the action was decided on
    #[error("Unknown element reference: {0}")]
    UnknownReference(String),

    /// Scroll target is invalid or unreachable
    #[error("Scroll target invalid: {0}")]
    ScrollTargetInvalid(String),

    /// Action fields are unusable (empty keys, missing file)
    #[error("Invalid action input: {0}")]
    InvalidInput(String),

    /// A file the action produces could not be written
    #[error("Artifact write failed: {0}")]
    ArtifactWrite(String),

    /// CDP communication or protocol error
    #[error("CDP I/O error: {0}")]
    CdpIo(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ActionError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ActionError::WaitTimeout(_)
                | ActionError::NavTimeout(_)
                | ActionError::NotClickable(_)
                | ActionError::CdpIo(_)
        )
    }

    /// Get error severity level (0=low, 1=medium, 2=high, 3=critical)
    pub fn severity(&self) -> u8 {
        match self {
            ActionError::Internal(_) => 3,
            ActionError::NavTimeout(_) | ActionError::CdpIo(_) | ActionError::UnknownReference(_) => 2,
            ActionError::WaitTimeout(_)
            | ActionError::AnchorNotFound(_)
            | ActionError::ClickExhausted { .. } => 1,
            _ => 0,
        }
    }

    /// Map a driver failure raised while navigating.
    pub fn navigation(err: AdapterError) -> Self {
        if err.kind == AdapterErrorKind::Timeout {
            ActionError::NavTimeout(err.hint.unwrap_or_else(|| err.kind.to_string()))
        } else {
            ActionError::from(err)
        }
    }
}

impl From<AdapterError> for ActionError {
    fn from(err: AdapterError) -> Self {
        let message = err.to_string();
        let detail = err.hint.clone().unwrap_or_else(|| message.clone());
        match err.kind {
            AdapterErrorKind::Timeout => ActionError::WaitTimeout(detail),
            AdapterErrorKind::TargetNotFound => ActionError::AnchorNotFound(detail),
            AdapterErrorKind::NotInteractable => ActionError::NotClickable(detail),
            AdapterErrorKind::OptionNotFound => ActionError::OptionNotFound(detail),
            AdapterErrorKind::CdpIo => ActionError::CdpIo(message),
            AdapterErrorKind::Launch | AdapterErrorKind::Internal => ActionError::Internal(message),
        }
    }
}

impl From<LocatorError> for ActionError {
    fn from(err: LocatorError) -> Self {
        match err {
            LocatorError::UnknownReference(ref_id) => ActionError::UnknownReference(ref_id),
            not_found @ LocatorError::ElementNotFound { .. } => {
                ActionError::AnchorNotFound(not_found.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_kinds_map_to_action_errors() {
        let err = ActionError::from(AdapterError::new(AdapterErrorKind::NotInteractable).with_hint("covered"));
        assert_eq!(err, ActionError::NotClickable("covered".into()));
        assert!(err.is_retryable());

        let err = ActionError::from(AdapterError::not_found("gone"));
        assert_eq!(err, ActionError::AnchorNotFound("gone".into()));
    }

    #[test]
    fn navigation_timeouts_are_nav_timeouts() {
        let err = ActionError::navigation(AdapterError::timeout("60000ms"));
        assert_eq!(err, ActionError::NavTimeout("60000ms".into()));
        assert_eq!(err.severity(), 2);
    }

    #[test]
    fn locator_failures_name_the_reference() {
        let err = ActionError::from(LocatorError::ElementNotFound {
            ref_id: "e7".into(),
            attempts: 4,
        });
        assert!(err.to_string().contains("[e7]"));
    }
}
