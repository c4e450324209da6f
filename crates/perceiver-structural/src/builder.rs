use async_trait::async_trait;
use cdp_adapter::PageDriver;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::SnapshotError;
use crate::model::{PageSnapshot, SnapshotSource};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SnapshotOptions {
    /// Upper bound on rendered snapshot text, in characters.
    pub char_budget: usize,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            char_budget: 15_000,
        }
    }
}

#[async_trait]
pub trait SnapshotBuilder: Send + Sync {
    fn source(&self) -> SnapshotSource;

    async fn capture(&self, page: &dyn PageDriver) -> Result<PageSnapshot, SnapshotError>;

    /// Like [`SnapshotBuilder::capture`], but never fails: errors become an empty sentinel.
    async fn build(&self, page: &dyn PageDriver) -> PageSnapshot {
        match self.capture(page).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(source = ?self.source(), error = %err, "Snapshot capture failed");
                let url = page.url().await.unwrap_or_default();
                PageSnapshot::error(url, err.to_string())
            }
        }
    }
}
