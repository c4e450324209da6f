//! Element resolver with fallback chain orchestration

use std::sync::Arc;

use async_trait::async_trait;
use cdp_adapter::PageDriver;
use perceiver_structural::LocatorHints;
use tracing::{debug, info, warn};

use crate::errors::LocatorError;
use crate::strategies::{AttributeStrategy, RoleNameStrategy, Strategy, XPathStrategy};
use crate::types::{LocatorStrategy, Resolution};

#[async_trait]
pub trait ElementResolver: Send + Sync {
    /// Find the live element for `ref_id`, first successful strategy wins.
    async fn resolve(
        &self,
        page: &dyn PageDriver,
        ref_id: &str,
        hints: &LocatorHints,
    ) -> Result<Resolution, LocatorError>;
}

pub struct DefaultElementResolver {
    strategies: Vec<Arc<dyn Strategy>>,
}

impl Default for DefaultElementResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultElementResolver {
    pub fn new() -> Self {
        let strategies = LocatorStrategy::fallback_chain()
            .into_iter()
            .map(|strategy| -> Arc<dyn Strategy> {
                match strategy {
                    LocatorStrategy::RoleName => Arc::new(RoleNameStrategy),
                    LocatorStrategy::XPath => Arc::new(XPathStrategy),
                    LocatorStrategy::Attribute => Arc::new(AttributeStrategy),
                }
            })
            .collect();
        Self { strategies }
    }
}

#[async_trait]
impl ElementResolver for DefaultElementResolver {
    async fn resolve(
        &self,
        page: &dyn PageDriver,
        ref_id: &str,
        hints: &LocatorHints,
    ) -> Result<Resolution, LocatorError> {
        let mut attempts = 0usize;
        for strategy in &self.strategies {
            for query in strategy.queries(hints) {
                attempts += 1;
                let matches = match page.query(&query).await {
                    Ok(matches) => matches,
                    Err(err) => {
                        warn!(ref_id, strategy = strategy.name(), query = %query.describe(), error = %err, "Locator query failed");
                        continue;
                    }
                };
                if matches.is_empty() {
                    debug!(ref_id, strategy = strategy.name(), query = %query.describe(), "No matches");
                    continue;
                }
                let candidates = matches.len();
                let Some(handle) = matches.into_iter().next() else {
                    continue;
                };
                info!(
                    ref_id,
                    strategy = strategy.name(),
                    candidates,
                    "Resolved element"
                );
                return Ok(Resolution {
                    ref_id: ref_id.to_string(),
                    handle,
                    strategy: strategy.strategy_type(),
                    query,
                    candidates,
                });
            }
        }

        Err(LocatorError::ElementNotFound {
            ref_id: ref_id.to_string(),
            attempts,
        })
    }
}
