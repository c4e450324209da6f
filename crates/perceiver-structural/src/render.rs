//! Shared line rendering and budget truncation.

use std::collections::HashSet;

const NAME_LIMIT: usize = 100;
const TRUNCATION_MARKER: &str = "- ... (snapshot truncated)";

pub(crate) struct Line {
    pub depth: usize,
    pub ref_id: Option<String>,
    pub text: String,
}

#[derive(Default)]
pub(crate) struct LineParts<'a> {
    pub role: &'a str,
    pub name: &'a str,
    pub value: &'a str,
    pub checked: Option<bool>,
    pub disabled: bool,
    pub expanded: Option<bool>,
    pub description: &'a str,
}

pub(crate) fn format_line(ref_id: Option<&str>, parts: &LineParts<'_>) -> String {
    let mut line = String::from("- ");
    if let Some(ref_id) = ref_id {
        line.push_str(&format!("[{ref_id}] "));
    }
    line.push_str(parts.role);
    let name = shown(parts.name);
    if !name.is_empty() {
        line.push_str(&format!(" {:?}", clip(&name, NAME_LIMIT)));
    }
    let value = shown(parts.value);
    if !value.is_empty() {
        line.push_str(&format!(" value={:?}", clip(&value, NAME_LIMIT)));
    }
    if parts.checked == Some(true) {
        line.push_str(" checked");
    }
    if parts.disabled {
        line.push_str(" disabled");
    }
    if parts.expanded == Some(true) {
        line.push_str(" expanded");
    }
    let description = shown(parts.description);
    if !description.is_empty() && description != name {
        line.push_str(&format!(" desc={:?}", clip(&description, NAME_LIMIT)));
    }
    line
}

/// Join lines up to `budget` characters, cutting only at line boundaries.
///
/// Returns the text and the references whose lines survived.
pub(crate) fn render(lines: &[Line], budget: usize) -> (String, HashSet<String>) {
    let mut out = String::new();
    let mut kept = HashSet::new();
    let mut used = 0usize;
    for (index, line) in lines.iter().enumerate() {
        let rendered = format!("{}{}", "  ".repeat(line.depth), line.text);
        let cost = rendered.chars().count() + usize::from(index > 0);
        let remaining_after = lines.len() - index - 1;
        let reserve = if remaining_after > 0 {
            TRUNCATION_MARKER.len() + 1
        } else {
            0
        };
        if used + cost + reserve > budget {
            if used + TRUNCATION_MARKER.len() + 1 <= budget {
                if !out.is_empty() {
                    out.push('\n');
                }
                out.push_str(TRUNCATION_MARKER);
            }
            return (out, kept);
        }
        if index > 0 {
            out.push('\n');
        }
        out.push_str(&rendered);
        used += cost;
        if let Some(ref_id) = &line.ref_id {
            kept.insert(ref_id.clone());
        }
    }
    (out, kept)
}

pub(crate) fn clean(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Page text as rendered in a line. Square brackets are reserved for reference tokens.
fn shown(value: &str) -> String {
    clean(value).replace('[', "(").replace(']', ")")
}

fn clip(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        value.to_string()
    } else {
        value.chars().take(max).collect::<String>() + "..."
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_shows_markers_in_fixed_order() {
        let line = format_line(
            Some("e4"),
            &LineParts {
                role: "checkbox",
                name: "Remember\n me",
                checked: Some(true),
                expanded: Some(true),
                description: "keeps you signed in",
                ..LineParts::default()
            },
        );
        assert_eq!(
            line,
            "- [e4] checkbox \"Remember me\" checked expanded desc=\"keeps you signed in\""
        );
    }

    #[test]
    fn page_text_cannot_forge_reference_tokens() {
        let line = format_line(
            None,
            &LineParts {
                role: "heading",
                name: "Click [e9] to continue",
                value: "[x]",
                description: "see ]e2[",
                ..LineParts::default()
            },
        );
        assert_eq!(
            line,
            "- heading \"Click (e9) to continue\" value=\"(x)\" desc=\"see )e2(\""
        );
    }

    #[test]
    fn truncation_never_splits_a_line() {
        let lines: Vec<Line> = (1..=50)
            .map(|i| Line {
                depth: 1,
                ref_id: Some(format!("e{i}")),
                text: format!("- [e{i}] button \"Button number {i}\""),
            })
            .collect();
        let (text, kept) = render(&lines, 200);
        assert!(text.chars().count() <= 200);
        assert!(text.ends_with(TRUNCATION_MARKER));
        for line in text.lines().filter(|l| l.contains('[')) {
            assert!(line.ends_with('"'));
        }
        assert_eq!(kept.len(), text.lines().filter(|l| l.contains("[e")).count());
    }
}
