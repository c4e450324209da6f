//! Post-action verification
//!
//! The verifier captures a cheap page fingerprint (URL, interactive element count, hash of
//! the leading visible text) before an action and diffs it against a fresh capture after a
//! settle delay. Whether a difference is required depends on the action type.

pub mod errors;
pub mod types;
pub mod verifier;

pub use errors::GateError;
pub use types::{PageState, StateDelta, VerificationResult, VerificationRule, CONTENT_HASH_CHARS};
pub use verifier::{content_hash, ActionVerifier, DefaultActionVerifier};
