//! Locator resolution.
//!
//! Snapshot references are snapshot-time artifacts: by the time an action runs the DOM may
//! have re-rendered. Resolution therefore re-finds the element from its recorded hints,
//! trying strategies in a fixed order:
//! 1. Role + accessible name (exact, then substring)
//! 2. Recorded XPath
//! 3. Attributes (`name`, then `aria-label`, then `placeholder`)

pub mod errors;
pub mod resolver;
pub mod strategies;
pub mod types;

pub use errors::LocatorError;
pub use resolver::{DefaultElementResolver, ElementResolver};
pub use strategies::{AttributeStrategy, RoleNameStrategy, Strategy, XPathStrategy};
pub use types::{LocatorStrategy, Resolution};
