//! Core types for locator system

use cdp_adapter::{ElementHandle, ElementQuery};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocatorStrategy {
    /// Accessible role and name
    RoleName,

    /// Recorded XPath
    XPath,

    /// Attribute fallbacks
    Attribute,
}

impl LocatorStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            LocatorStrategy::RoleName => "role-name",
            LocatorStrategy::XPath => "xpath",
            LocatorStrategy::Attribute => "attribute",
        }
    }

    /// Get all strategies in fallback order
    pub fn fallback_chain() -> Vec<LocatorStrategy> {
        vec![
            LocatorStrategy::RoleName,
            LocatorStrategy::XPath,
            LocatorStrategy::Attribute,
        ]
    }
}

/// A live element found for a snapshot reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    pub ref_id: String,
    pub handle: ElementHandle,
    pub strategy: LocatorStrategy,
    pub query: ElementQuery,
    /// Matches the winning query returned. The first one is used.
    pub candidates: usize,
}
