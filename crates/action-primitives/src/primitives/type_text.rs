//! Keyboard primitives - input_text, type_text and keypress

use cdp_adapter::{ClickMode, ElementHandle, ElementQuery};
use rand::Rng;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use crate::{
    classifier::FieldDescriptor,
    errors::ActionError,
    primitives::ActionExecutor,
    types::{ActionReport, ElementTarget},
};

/// Inputs tried, in order, when the referenced field cannot be found.
pub const SEARCH_INPUT_SELECTORS: &[&str] = &[
    r#"input[type="search"]"#,
    r#"textarea[name="q"]"#,
    r#"input[name="q"]"#,
    r#"input[name="search"]"#,
    r#"[role="searchbox"]"#,
    r#"[role="combobox"]"#,
    r#"input[type="text"]"#,
];

/// Execute input_text primitive
///
/// Steps:
/// 1. Resolve the element, falling back to common search inputs
/// 2. Focus by clicking, programmatic focus if the click fails
/// 3. Clear the existing value
/// 4. Type with a randomized per-character delay
/// 5. Submit with Enter when the field is a search field and not a credential field
pub async fn execute_input_text(
    executor: &ActionExecutor,
    target: Option<&ElementTarget>,
    ref_id: &str,
    text: &str,
) -> Result<ActionReport, ActionError> {
    let page = executor.page();
    let mut report = ActionReport::new();

    // 1. Resolve
    let (handle, resolved) = match executor.resolve(target, ref_id).await {
        Ok(resolution) => {
            report = report.resolved_by(&resolution);
            (resolution.handle, true)
        }
        Err(err) => {
            warn!(ref_id, error = %err, "Input target not resolved, trying search inputs");
            match find_search_input(executor).await {
                Some((selector, handle)) => {
                    report = report.with_detail(format!("fallback input {selector}"));
                    (handle, false)
                }
                None => return Err(err),
            }
        }
    };

    // 2. Focus
    if let Err(err) = page
        .click(&handle, ClickMode::Standard, executor.config().action_timeout)
        .await
    {
        debug!(element = %handle.description, error = %err, "Focus click failed, focusing programmatically");
        page.focus(&handle).await?;
    }

    // 3. Clear
    page.clear(&handle).await?;

    // 4. Type
    type_characters(executor, text).await?;

    // 5. Submit search fields
    let attributes = match page.attributes(&handle).await {
        Ok(attributes) => attributes,
        Err(err) => {
            debug!(error = %err, "Could not read field attributes");
            Default::default()
        }
    };
    // A fallback input is a different element, so the reference's hints do not describe it.
    let hints = target.filter(|_| resolved).map(|t| &t.hints);
    let field = FieldDescriptor::new(hints, attributes);
    let classification = executor.classifier().classify(&field);
    if classification.submits_on_enter() {
        page.press_key("Enter").await?;
        executor.pause(executor.config().settle_delay).await;
        report = report.with_detail("submitted with Enter");
    }

    info!(
        ref_id,
        chars = text.chars().count(),
        search = classification.search,
        credential = classification.credential,
        "Input completed successfully"
    );
    Ok(report)
}

/// Execute type_text primitive: type into whatever currently has focus.
pub async fn execute_type_text(
    executor: &ActionExecutor,
    text: &str,
) -> Result<ActionReport, ActionError> {
    type_characters(executor, text).await?;
    info!(chars = text.chars().count(), "Typed into focused element");
    Ok(ActionReport::new())
}

/// Execute keypress primitive. `keys` holds one or more keys or chords separated by
/// spaces or commas, pressed in order.
pub async fn execute_keypress(
    executor: &ActionExecutor,
    keys: &str,
) -> Result<ActionReport, ActionError> {
    let sequence = split_keys(keys);
    if sequence.is_empty() {
        return Err(ActionError::InvalidInput("no keys to press".to_string()));
    }
    for key in &sequence {
        executor.page().press_key(key).await?;
    }
    info!(keys = %sequence.join(" "), "Keys pressed");
    Ok(ActionReport::new().with_detail(sequence.join(" ")))
}

pub fn split_keys(keys: &str) -> Vec<String> {
    keys.split(|c: char| c.is_whitespace() || c == ',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect()
}

async fn type_characters(executor: &ActionExecutor, text: &str) -> Result<(), ActionError> {
    let config = executor.config();
    let (low, high) = (
        config.type_delay_min_ms.min(config.type_delay_max_ms),
        config.type_delay_max_ms.max(config.type_delay_min_ms),
    );
    for ch in text.chars() {
        executor.page().type_char(ch).await?;
        let delay = rand::thread_rng().gen_range(low..=high);
        if delay > 0 {
            sleep(Duration::from_millis(delay)).await;
        }
    }
    Ok(())
}

async fn find_search_input(executor: &ActionExecutor) -> Option<(&'static str, ElementHandle)> {
    for selector in SEARCH_INPUT_SELECTORS {
        let query = ElementQuery::Css {
            selector: (*selector).to_string(),
        };
        match executor.page().query(&query).await {
            Ok(matches) => {
                if let Some(handle) = matches.into_iter().next() {
                    debug!(selector, "Found fallback input");
                    return Some((*selector, handle));
                }
            }
            Err(err) => debug!(selector, error = %err, "Fallback query failed"),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_split_on_spaces_and_commas() {
        assert_eq!(split_keys("Tab, Tab Enter"), vec!["Tab", "Tab", "Enter"]);
        assert_eq!(split_keys("Control+A"), vec!["Control+A"]);
        assert!(split_keys(" , ").is_empty());
    }
}
