//! Coordinate primitives - pointer actions in viewport CSS pixels

use surfpilot_core_types::MouseButton;
use tracing::info;

use crate::{errors::ActionError, primitives::ActionExecutor, types::ActionReport};

fn check_point(x: f64, y: f64) -> Result<(), ActionError> {
    if !x.is_finite() || !y.is_finite() || x < 0.0 || y < 0.0 {
        return Err(ActionError::InvalidInput(format!(
            "coordinates ({x}, {y}) are outside the viewport"
        )));
    }
    Ok(())
}

/// Points strictly after `from` up to and including `to`.
pub fn interpolate(from: (f64, f64), to: (f64, f64), steps: u32) -> Vec<(f64, f64)> {
    let steps = steps.max(1);
    (1..=steps)
        .map(|i| {
            let t = i as f64 / steps as f64;
            (from.0 + (to.0 - from.0) * t, from.1 + (to.1 - from.1) * t)
        })
        .collect()
}

pub async fn execute_click_xy(
    executor: &ActionExecutor,
    x: f64,
    y: f64,
    button: MouseButton,
) -> Result<ActionReport, ActionError> {
    check_point(x, y)?;
    executor.page().click_at(x, y, button).await?;
    executor.set_pointer(x, y);

    info!(x, y, button = ?button, "Coordinate click completed");
    Ok(ActionReport::new())
}

pub async fn execute_move(
    executor: &ActionExecutor,
    x: f64,
    y: f64,
    steps: u32,
) -> Result<ActionReport, ActionError> {
    check_point(x, y)?;
    let from = executor.pointer();
    for (px, py) in interpolate(from, (x, y), steps) {
        executor.page().mouse_move(px, py).await?;
    }
    executor.set_pointer(x, y);

    info!(x, y, steps, "Pointer moved");
    Ok(ActionReport::new())
}

/// Press at the current pointer position, move in steps, release at the target.
pub async fn execute_drag(
    executor: &ActionExecutor,
    x: f64,
    y: f64,
    steps: u32,
    button: MouseButton,
) -> Result<ActionReport, ActionError> {
    check_point(x, y)?;
    let page = executor.page();
    let from = executor.pointer();

    page.mouse_down(from.0, from.1, button).await?;
    for (px, py) in interpolate(from, (x, y), steps) {
        page.mouse_move(px, py).await?;
    }
    page.mouse_up(x, y, button).await?;
    executor.set_pointer(x, y);

    info!(from_x = from.0, from_y = from.1, x, y, steps, "Drag completed");
    Ok(ActionReport::new())
}

pub async fn execute_mouse_down(
    executor: &ActionExecutor,
    x: f64,
    y: f64,
    button: MouseButton,
) -> Result<ActionReport, ActionError> {
    check_point(x, y)?;
    executor.page().mouse_move(x, y).await?;
    executor.page().mouse_down(x, y, button).await?;
    executor.set_pointer(x, y);
    Ok(ActionReport::new())
}

pub async fn execute_mouse_up(
    executor: &ActionExecutor,
    x: f64,
    y: f64,
    button: MouseButton,
) -> Result<ActionReport, ActionError> {
    check_point(x, y)?;
    executor.page().mouse_move(x, y).await?;
    executor.page().mouse_up(x, y, button).await?;
    executor.set_pointer(x, y);
    Ok(ActionReport::new())
}

pub async fn execute_wheel(
    executor: &ActionExecutor,
    x: f64,
    y: f64,
    delta_x: f64,
    delta_y: f64,
) -> Result<ActionReport, ActionError> {
    check_point(x, y)?;
    executor.page().wheel(x, y, delta_x, delta_y).await?;
    executor.set_pointer(x, y);
    executor.pause(executor.config().scroll_settle).await;

    info!(x, y, delta_x, delta_y, "Wheel dispatched");
    Ok(ActionReport::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolation_ends_exactly_on_target() {
        let points = interpolate((0.0, 0.0), (100.0, 50.0), 4);
        assert_eq!(points.len(), 4);
        assert_eq!(points[0], (25.0, 12.5));
        assert_eq!(points[3], (100.0, 50.0));
    }

    #[test]
    fn zero_steps_is_one_step() {
        assert_eq!(interpolate((5.0, 5.0), (10.0, 10.0), 0), vec![(10.0, 10.0)]);
    }

    #[test]
    fn negative_coordinates_are_rejected() {
        assert!(check_point(-1.0, 10.0).is_err());
        assert!(check_point(f64::NAN, 10.0).is_err());
        assert!(check_point(0.0, 0.0).is_ok());
    }
}
