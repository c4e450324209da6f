//! Screenshot primitive - capture the page or one element and save it as PNG

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::info;

use crate::{
    errors::ActionError,
    primitives::ActionExecutor,
    types::{ActionReport, ElementTarget},
};

/// Capture and write the PNG under [`crate::ExecutorConfig::screenshot_dir`].
///
/// The report detail is the written path.
pub async fn execute_screenshot(
    executor: &ActionExecutor,
    target: Option<&ElementTarget>,
    ref_id: Option<&str>,
    full_page: bool,
    filename: Option<&str>,
) -> Result<ActionReport, ActionError> {
    let path = screenshot_path(&executor.config().screenshot_dir, filename)?;

    let (bytes, report) = match ref_id {
        Some(ref_id) => {
            let resolution = executor.resolve(target, ref_id).await?;
            let bytes = executor
                .page()
                .element_screenshot(&resolution.handle)
                .await?;
            (bytes, ActionReport::new().resolved_by(&resolution))
        }
        None => (executor.page().screenshot(full_page).await?, ActionReport::new()),
    };

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .map_err(|err| ActionError::ArtifactWrite(format!("{}: {err}", dir.display())))?;
    }
    std::fs::write(&path, &bytes)
        .map_err(|err| ActionError::ArtifactWrite(format!("{}: {err}", path.display())))?;

    info!(path = %path.display(), bytes = bytes.len(), full_page, "Screenshot saved");
    Ok(report.with_detail(path.display().to_string()))
}

/// Only the final path component of `filename` is used, with `.png` enforced.
pub(crate) fn screenshot_path(dir: &Path, filename: Option<&str>) -> Result<PathBuf, ActionError> {
    let name = match filename.map(str::trim).filter(|name| !name.is_empty()) {
        Some(raw) => {
            let base = Path::new(raw)
                .file_name()
                .and_then(|name| name.to_str())
                .ok_or_else(|| {
                    ActionError::InvalidInput(format!("screenshot filename {raw:?} is not a file name"))
                })?;
            if base.to_ascii_lowercase().ends_with(".png") {
                base.to_string()
            } else {
                format!("{base}.png")
            }
        }
        None => format!("screenshot_{}.png", Utc::now().format("%Y%m%d_%H%M%S_%3f")),
    };
    Ok(dir.join(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filenames_stay_inside_the_screenshot_dir() {
        let dir = Path::new("/tmp/shots");
        assert_eq!(
            screenshot_path(dir, Some("../../etc/results")).expect("path"),
            dir.join("results.png")
        );
        assert_eq!(
            screenshot_path(dir, Some("Cart.PNG")).expect("path"),
            dir.join("Cart.PNG")
        );
        let generated = screenshot_path(dir, Some("  ")).expect("path");
        let name = generated.file_name().and_then(|n| n.to_str()).expect("name");
        assert!(name.starts_with("screenshot_") && name.ends_with(".png"));
        assert!(screenshot_path(dir, Some("..")).is_err());
    }
}
