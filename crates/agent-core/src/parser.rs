//! Model output → [`Decision`].
//!
//! Parsing is total: whatever the model produced, the caller gets a decision back. Output
//! that cannot be understood at all becomes a two-second `wait`. A well-formed action that
//! is missing fields or points at an unknown element becomes an invalid decision whose
//! reason is fed back to the model on the next step.

use perceiver_structural::PageSnapshot;
use serde_json::{Map, Value};
use surfpilot_core_types::{
    normalize_action_type, Action, ActionKind, Decision, ParseError,
};
use tracing::{debug, warn};

/// Pull the first JSON object out of free-form model text.
///
/// Handles bare objects, fenced code blocks and objects embedded in prose.
pub fn extract_json_object(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') {
        if let Some(object) = balanced_object(trimmed) {
            return Some(object.to_string());
        }
    }

    let fence = "```";
    if let Some(start) = raw.find(fence) {
        let after_fence = &raw[start + fence.len()..];
        let after_lang = after_fence.trim_start_matches(|c: char| c.is_alphanumeric() || c == '_');
        if let Some(end) = after_lang.find(fence) {
            if let Some(object) = balanced_object(&after_lang[..end]) {
                return Some(object.to_string());
            }
        }
    }

    balanced_object(raw).map(str::to_string)
}

/// First brace-balanced `{...}` span, ignoring braces inside string literals.
fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse one model response against the snapshot it was produced for.
pub fn parse_decision(raw: &str, snapshot: &PageSnapshot) -> Decision {
    let Some(json) = extract_json_object(raw) else {
        warn!(chars = raw.len(), "Model output contained no JSON object; waiting");
        return Decision::fallback_wait("model output contained no JSON object");
    };
    let value: Value = match serde_json::from_str(&json) {
        Ok(value) => value,
        Err(err) => {
            let err = ParseError::Json(err.to_string());
            warn!(error = %err, "Model output is not valid JSON; waiting");
            return Decision::fallback_wait(err.to_string());
        }
    };
    let Some(outer) = value.as_object() else {
        return Decision::fallback_wait(ParseError::NotAnObject.to_string());
    };

    let reasoning = text_field(outer, &["reasoning", "thought", "thinking"]).unwrap_or_default();
    // Some models nest the action: {"reasoning": "...", "action": {...}}
    let payload = match outer.get("action") {
        Some(Value::Object(inner)) => inner,
        _ => outer,
    };

    let raw_type = payload
        .get("action_type")
        .or_else(|| payload.get("action"))
        .and_then(Value::as_str);
    let Some(raw_type) = raw_type else {
        warn!("Model output has no action_type; waiting");
        return Decision::fallback_wait(ParseError::MissingActionType.to_string());
    };
    let Some(kind) = normalize_action_type(raw_type) else {
        warn!(action_type = raw_type, "Unknown action type; waiting");
        return Decision::fallback_wait(ParseError::UnknownActionType(raw_type.to_string()).to_string());
    };

    let action = match Action::from_fields(kind, payload) {
        Ok(action) => action,
        Err(err) => {
            debug!(action = %kind, error = %err, "Model action is missing fields");
            return Decision::invalid(kind, None, reasoning, err.to_string());
        }
    };

    if let Some(element_id) = action.element_id() {
        // input_text falls back to well-known search inputs when the ref is unknown.
        if snapshot.get(element_id).is_none() && kind != ActionKind::InputText {
            let error = format!("unknown element reference: {element_id}");
            debug!(action = %kind, element_id, "Model referenced an element not in the snapshot");
            return Decision::invalid(kind, Some(action), reasoning, error);
        }
    }

    Decision::valid(action, reasoning)
}

fn text_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| obj.get(*key).and_then(Value::as_str))
        .map(|text| text.trim().to_string())
        .find(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use perceiver_structural::{ElementReference, LocatorHints, SnapshotSource};

    fn snapshot() -> PageSnapshot {
        let reference = ElementReference {
            ref_id: "e1".into(),
            role: "button".into(),
            name: "Login".into(),
            description: String::new(),
            value: String::new(),
            checked: None,
            disabled: false,
            expanded: None,
            tag: None,
            hints: LocatorHints {
                role: "button".into(),
                name: "Login".into(),
                ..LocatorHints::default()
            },
        };
        PageSnapshot::from_references(
            "https://example.com",
            "- RootWebArea \"Example\"\n  - [e1] button \"Login\"".into(),
            vec![reference],
            SnapshotSource::Accessibility,
        )
    }

    #[test]
    fn extracts_from_fenced_block() {
        let input = "Here you go:\n```json\n{\"action_type\":\"reload\"}\n```";
        assert_eq!(extract_json_object(input).as_deref(), Some("{\"action_type\":\"reload\"}"));
    }

    #[test]
    fn extracts_inline_object_and_skips_braces_in_strings() {
        let input = "I will type {\"action_type\":\"type_text\",\"text\":\"a } b\"} now";
        assert_eq!(
            extract_json_object(input).as_deref(),
            Some("{\"action_type\":\"type_text\",\"text\":\"a } b\"}")
        );
        assert!(extract_json_object("no braces here").is_none());
    }

    #[test]
    fn unparsable_output_waits_two_seconds() {
        for raw in ["I think we should click", "{\"action_type\": ", "{\"action_type\":\"teleport\"}"] {
            let decision = parse_decision(raw, &snapshot());
            assert!(decision.is_valid(), "{raw}");
            assert_eq!(decision.action, Some(Action::Wait { seconds: 2.0 }), "{raw}");
        }
    }

    #[test]
    fn aliases_normalize_to_canonical_actions() {
        let decision = parse_decision(
            r#"{"action_type":"click_element","element_id":"[e1]","reasoning":"log in"}"#,
            &snapshot(),
        );
        assert!(decision.is_valid());
        assert_eq!(decision.kind, ActionKind::Click);
        assert_eq!(decision.reasoning, "log in");
    }

    #[test]
    fn missing_required_field_is_invalid_with_reason() {
        let decision = parse_decision(r#"{"action_type":"goto_url"}"#, &snapshot());
        assert!(!decision.is_valid());
        assert_eq!(decision.kind, ActionKind::GotoUrl);
        assert!(decision.error.as_deref().unwrap_or_default().contains("url"));
    }

    #[test]
    fn unknown_element_reference_is_invalid() {
        let decision = parse_decision(r#"{"action_type":"click","element_id":"e42"}"#, &snapshot());
        assert!(!decision.is_valid());
        assert!(decision.action.is_some());
        assert!(decision.error.as_deref().unwrap_or_default().contains("e42"));
    }

    #[test]
    fn input_text_keeps_unknown_refs_for_search_fallback() {
        let decision = parse_decision(
            r#"{"action_type":"input_text","element_id":"e9","text":"rust jobs"}"#,
            &snapshot(),
        );
        assert!(decision.is_valid());
    }

    #[test]
    fn nested_action_objects_are_accepted() {
        let decision = parse_decision(
            r#"{"reasoning":"done","action":{"action_type":"complete"}}"#,
            &snapshot(),
        );
        assert_eq!(decision.kind, ActionKind::Complete);
        assert_eq!(decision.reasoning, "done");
    }
}
