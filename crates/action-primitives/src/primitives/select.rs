//! Element primitives that do not click - select_option, hover and upload_file

use std::path::PathBuf;

use tracing::info;

use crate::{
    errors::ActionError,
    primitives::ActionExecutor,
    types::{ActionReport, ElementTarget},
};

/// Execute select primitive
///
/// Options are matched by visible text or value, case-insensitively.
pub async fn execute_select(
    executor: &ActionExecutor,
    target: Option<&ElementTarget>,
    ref_id: &str,
    option: &str,
) -> Result<ActionReport, ActionError> {
    let resolution = executor.resolve(target, ref_id).await?;
    executor
        .page()
        .select_option(&resolution.handle, option)
        .await?;

    info!(ref_id, option, "Select completed successfully");
    Ok(ActionReport::new()
        .resolved_by(&resolution)
        .with_detail(format!("selected {option:?}")))
}

pub async fn execute_hover(
    executor: &ActionExecutor,
    target: Option<&ElementTarget>,
    ref_id: &str,
) -> Result<ActionReport, ActionError> {
    let resolution = executor.resolve(target, ref_id).await?;
    executor.page().hover(&resolution.handle).await?;

    info!(ref_id, "Hover completed successfully");
    Ok(ActionReport::new().resolved_by(&resolution))
}

/// Execute upload primitive. The local file must exist before the element is touched.
pub async fn execute_upload(
    executor: &ActionExecutor,
    target: Option<&ElementTarget>,
    ref_id: &str,
    path: &str,
) -> Result<ActionReport, ActionError> {
    let file = PathBuf::from(path.trim());
    if !file.is_file() {
        return Err(ActionError::InvalidInput(format!(
            "upload file {} does not exist",
            file.display()
        )));
    }
    let file = std::fs::canonicalize(&file).unwrap_or(file);

    let resolution = executor.resolve(target, ref_id).await?;
    executor
        .page()
        .set_files(&resolution.handle, std::slice::from_ref(&file))
        .await?;

    info!(ref_id, file = %file.display(), "Upload completed successfully");
    Ok(ActionReport::new()
        .resolved_by(&resolution)
        .with_detail(file.display().to_string()))
}
