//! Navigate primitives - goto_url, reload and history traversal

use tracing::{info, warn};

use crate::{errors::ActionError, primitives::ActionExecutor, types::ActionReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryDirection {
    Back,
    Forward,
}

/// Prefix bare hosts (`example.com/path`) with `https://`.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.contains("://") || trimmed.starts_with("about:") || trimmed.starts_with("data:") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed.trim_start_matches('/'))
    }
}

/// Execute navigate primitive
///
/// Steps:
/// 1. Normalize the URL
/// 2. Navigate, bounded by the navigation timeout
/// 3. Wait for the load to settle
pub async fn execute_navigate(
    executor: &ActionExecutor,
    url: &str,
) -> Result<ActionReport, ActionError> {
    if url.trim().is_empty() {
        return Err(ActionError::InvalidInput("empty url".to_string()));
    }

    // 1. Normalize
    let url = normalize_url(url);

    // 2. Navigate
    executor
        .page()
        .goto(&url, executor.config().navigation_timeout)
        .await
        .map_err(ActionError::navigation)?;

    // 3. Built-in waiting
    settle(executor).await;

    info!(url = %url, "Navigation completed successfully");
    Ok(ActionReport::new().with_detail(url))
}

pub async fn execute_reload(executor: &ActionExecutor) -> Result<ActionReport, ActionError> {
    executor
        .page()
        .reload(executor.config().navigation_timeout)
        .await
        .map_err(ActionError::navigation)?;
    settle(executor).await;
    info!("Reload completed successfully");
    Ok(ActionReport::new())
}

pub async fn execute_history(
    executor: &ActionExecutor,
    direction: HistoryDirection,
) -> Result<ActionReport, ActionError> {
    let page = executor.page();
    let moved = match direction {
        HistoryDirection::Back => page.go_back().await,
        HistoryDirection::Forward => page.go_forward().await,
    };
    moved.map_err(ActionError::navigation)?;
    settle(executor).await;
    info!(direction = ?direction, "History navigation completed");
    Ok(ActionReport::new())
}

/// A page that never reports `complete` is still usable, so a load timeout only warns.
async fn settle(executor: &ActionExecutor) {
    if let Err(err) = executor
        .page()
        .wait_for_load(executor.config().navigation_timeout)
        .await
    {
        warn!(error = %err, "Page did not finish loading");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_hosts_get_https() {
        assert_eq!(normalize_url("example.com/jobs"), "https://example.com/jobs");
        assert_eq!(normalize_url(" http://localhost:8080 "), "http://localhost:8080");
        assert_eq!(normalize_url("about:blank"), "about:blank");
    }
}
