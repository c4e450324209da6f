//! Page observation.
//!
//! Builders turn the live page into a [`PageSnapshot`]: a compact indented text tree for the
//! model plus a map from snapshot references (`e1`, `e2`, ...) to the hints needed to find
//! each element again at execution time.

pub mod ax;
pub mod builder;
pub mod dom;
pub mod errors;
pub mod model;
mod render;

pub use ax::AccessibilitySnapshotBuilder;
pub use builder::{SnapshotBuilder, SnapshotOptions};
pub use dom::DomSnapshotBuilder;
pub use errors::SnapshotError;
pub use model::{normalize_ref, ElementReference, LocatorHints, PageSnapshot, SnapshotSource};

/// Roles that receive a snapshot reference.
pub const INTERACTIVE_ROLES: &[&str] = &[
    "button",
    "link",
    "checkbox",
    "radio",
    "textbox",
    "combobox",
    "searchbox",
    "slider",
    "tab",
    "menuitem",
    "switch",
];

pub fn is_interactive_role(role: &str) -> bool {
    INTERACTIVE_ROLES
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(role))
}
