//! Wait primitive - fixed sleep, bounded by the configured maximum

use tokio::time::{sleep, Duration};
use tracing::{info, warn};

use crate::{errors::ActionError, primitives::ActionExecutor, types::ActionReport};

pub async fn execute_wait(
    executor: &ActionExecutor,
    seconds: f64,
) -> Result<ActionReport, ActionError> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(ActionError::InvalidInput(format!(
            "wait of {seconds}s is not a duration"
        )));
    }
    let max = executor.config().max_wait_secs.max(0.0);
    let bounded = seconds.min(max);
    if bounded < seconds {
        warn!(requested = seconds, max, "Wait clamped");
    }

    sleep(Duration::from_secs_f64(bounded)).await;

    info!(seconds = bounded, "Wait completed");
    Ok(ActionReport::new().with_detail(format!("waited {bounded}s")))
}
