//! Scroll primitive - scroll page or element into view

use cdp_adapter::ScrollTo;
use surfpilot_core_types::ScrollTarget;
use tracing::{debug, info};

use crate::{
    errors::ActionError,
    primitives::ActionExecutor,
    types::{ActionReport, ElementTarget},
};

/// Scroll a referenced element into view, then let the animation settle.
pub async fn execute_scroll_element(
    executor: &ActionExecutor,
    target: Option<&ElementTarget>,
    ref_id: &str,
) -> Result<ActionReport, ActionError> {
    let resolution = executor.resolve(target, ref_id).await?;
    debug!("Scrolling element into view: {}", resolution.handle.description);
    executor
        .page()
        .scroll_into_view(&resolution.handle)
        .await?;
    executor.pause(executor.config().scroll_settle).await;

    info!(ref_id, "Scroll completed successfully");
    Ok(ActionReport::new().resolved_by(&resolution))
}

/// Scroll the viewport by signed pixels or to the top or bottom of the document.
pub async fn execute_scroll_window(
    executor: &ActionExecutor,
    target: &ScrollTarget,
) -> Result<ActionReport, ActionError> {
    let to = match target {
        ScrollTarget::Pixels(0) => {
            return Err(ActionError::ScrollTargetInvalid(
                "scroll amount is zero".to_string(),
            ))
        }
        ScrollTarget::Pixels(px) => ScrollTo::By(*px),
        ScrollTarget::Top => ScrollTo::Top,
        ScrollTarget::Bottom => ScrollTo::Bottom,
        ScrollTarget::Element(id) => {
            return Err(ActionError::ScrollTargetInvalid(format!(
                "element [{id}] is not a window target"
            )))
        }
    };

    executor.page().scroll_window(to).await?;
    executor.pause(executor.config().scroll_settle).await;

    info!(target = ?target, "Scroll completed successfully");
    Ok(ActionReport::new())
}
