//! Action execution engine
//!
//! This crate turns typed agent actions into page operations:
//! - element actions resolve snapshot references through the locator fallback chain
//! - clicks escalate standard → forced → script
//! - text input focuses, clears, types with human cadence and submits search fields
//! - failures come back as structured [`ActionResult`]s, never as errors

pub mod classifier;
pub mod errors;
mod primitives;
pub mod types;

pub use classifier::{
    FieldClass, FieldClassification, FieldClassifier, FieldDescriptor, FieldMatcher, FieldRule,
    RuleTableClassifier,
};
pub use errors::ActionError;
pub use primitives::{normalize_url, split_keys, ActionExecutor, CLICK_LADDER, SEARCH_INPUT_SELECTORS};
pub use types::{ActionReport, ActionResult, ElementTarget, ExecutorConfig};
