//! Error types for locator system

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LocatorError {
    /// Every strategy came back empty.
    #[error("element [{ref_id}] not found after {attempts} locator queries")]
    ElementNotFound { ref_id: String, attempts: usize },

    /// The reference is not in the current snapshot.
    #[error("unknown element reference [{0}]")]
    UnknownReference(String),
}

impl LocatorError {
    pub fn ref_id(&self) -> &str {
        match self {
            LocatorError::ElementNotFound { ref_id, .. } | LocatorError::UnknownReference(ref_id) => {
                ref_id
            }
        }
    }

    /// Get error severity (0=low, 1=medium, 2=high, 3=critical)
    pub fn severity(&self) -> u8 {
        match self {
            LocatorError::ElementNotFound { .. } => 1,
            LocatorError::UnknownReference(_) => 2,
        }
    }
}
