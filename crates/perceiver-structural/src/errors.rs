use cdp_adapter::AdapterError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("page query failed: {0}")]
    Query(#[from] AdapterError),
    #[error("accessibility tree is empty")]
    EmptyTree,
    #[error("document could not be read: {0}")]
    Document(String),
}
