//! Click primitive - resolve the element, then escalate through click strategies

use cdp_adapter::{ClickMode, ElementHandle};
use tracing::{debug, info, warn};

use crate::{
    errors::ActionError,
    primitives::ActionExecutor,
    types::{ActionReport, ElementTarget},
};

/// Click strategies in escalation order.
pub const CLICK_LADDER: [ClickMode; 3] = [ClickMode::Standard, ClickMode::Forced, ClickMode::Script];

/// Execute click primitive
///
/// Steps:
/// 1. Resolve the reference through the locator fallback chain
/// 2. Escalate standard → forced → script click, pausing between rungs
/// 3. Generate action report
pub async fn execute_click(
    executor: &ActionExecutor,
    target: Option<&ElementTarget>,
    ref_id: &str,
) -> Result<ActionReport, ActionError> {
    // 1. Resolve
    let resolution = executor.resolve(target, ref_id).await?;

    // 2. Escalate
    let attempts = click_with_ladder(executor, &resolution.handle).await?;

    info!(
        ref_id,
        strategy = resolution.strategy.name(),
        attempts,
        "Click completed successfully"
    );

    // 3. Generate report
    Ok(ActionReport::new()
        .with_attempts(attempts)
        .resolved_by(&resolution))
}

/// Returns the number of attempts it took, or the last failure once every rung failed.
pub(crate) async fn click_with_ladder(
    executor: &ActionExecutor,
    handle: &ElementHandle,
) -> Result<u32, ActionError> {
    let mut last_error = None;

    for (index, mode) in CLICK_LADDER.iter().enumerate() {
        if index > 0 {
            executor.pause(executor.config().click_retry_delay).await;
        }
        let attempt = index as u32 + 1;
        debug!(element = %handle.description, mode = ?mode, attempt, "Attempting click");
        match executor
            .page()
            .click(handle, *mode, executor.config().action_timeout)
            .await
        {
            Ok(()) => return Ok(attempt),
            Err(err) => {
                warn!(element = %handle.description, mode = ?mode, error = %err, "Click attempt failed");
                last_error = Some(err);
            }
        }
    }

    Err(ActionError::ClickExhausted {
        attempts: CLICK_LADDER.len() as u32,
        last: last_error
            .map(|err| ActionError::from(err).to_string())
            .unwrap_or_default(),
    })
}
