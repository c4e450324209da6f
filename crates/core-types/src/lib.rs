//! Shared primitives for the SurfPilot agent crates.
//!
//! Everything that more than one layer needs to agree on lives here: session ids, the
//! typed [`Action`] taxonomy, the static action registry used for alias normalization,
//! and the log categories components attach to their tracing spans.

pub mod action;
pub mod log;
pub mod registry;

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use action::{
    Action, ActionKind, Decision, MouseButton, OutputFormat, ParseError, ScrollTarget,
};
pub use log::LogCategory;
pub use registry::{lookup, normalize_action_type, ActionCategory, ActionSpec, ACTION_REGISTRY};

/// Identifier of one agent session, rendered as `session_<8 hex>`.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        let raw = Uuid::new_v4().simple().to_string();
        Self(format!("session_{}", &raw[..8]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_have_short_hex_suffix() {
        let id = SessionId::new();
        let suffix = id.as_str().strip_prefix("session_").expect("prefix");
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, SessionId::new());
    }
}
