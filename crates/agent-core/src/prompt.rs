//! Prompt assembly for planning and per-step decisions.

use perceiver_structural::PageSnapshot;
use surfpilot_core_types::ACTION_REGISTRY;

/// Characters of element text shown per entry in the element list.
pub const ELEMENT_TEXT_CHARS: usize = 50;

pub const SYSTEM_PROMPT: &str = "You are a browser automation agent. You see the current page as an \
accessibility snapshot where interactive elements carry references like [e3]. Choose exactly one \
next action that moves toward the goal and answer with a single JSON object, no prose.";

const DECISION_EXAMPLES: &str = r#"Example: click a button
{"action_type": "click", "element_id": "e3", "reasoning": "The Sign in button opens the login form"}

Example: finish and hand back data
{"action_type": "complete", "reasoning": "All requested titles are collected", "extracted_data": [{"title": "Rust Engineer", "company": "Acme"}], "output_format": "json", "output_title": "Rust jobs"}"#;

/// Everything the model sees for one step.
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
    pub goal: &'a str,
    pub url: &'a str,
    pub snapshot: &'a PageSnapshot,
    /// Rendered [`memory_center::AgentMemory::context`].
    pub memory: &'a str,
    /// Previous steps, oldest first.
    pub history: &'a [String],
}

#[derive(Debug, Clone)]
pub struct PromptBuilder {
    element_limit: usize,
    snapshot_chars: usize,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(100, 15_000)
    }
}

impl PromptBuilder {
    pub fn new(element_limit: usize, snapshot_chars: usize) -> Self {
        Self {
            element_limit,
            snapshot_chars,
        }
    }

    pub fn system_prompt(&self) -> &'static str {
        SYSTEM_PROMPT
    }

    pub fn decision_prompt(&self, ctx: &PromptContext<'_>) -> String {
        let mut sections = vec![
            format!("GOAL: {}", ctx.goal),
            format!("CURRENT URL: {}", ctx.url),
        ];

        if !ctx.memory.trim().is_empty() {
            sections.push(ctx.memory.trim().to_string());
        }

        if !ctx.history.is_empty() {
            let mut block = String::from("PREVIOUS STEPS:");
            for line in ctx.history {
                block.push_str("\n- ");
                block.push_str(line);
            }
            sections.push(block);
        }

        sections.push(self.element_list(ctx.snapshot));
        sections.push(format!("PAGE SNAPSHOT:\n{}", self.snapshot_text(ctx.snapshot)));
        sections.push(format!("AVAILABLE ACTIONS:\n{}", action_list()));
        sections.push(DECISION_EXAMPLES.to_string());
        sections.push(
            "Respond with one JSON object containing action_type, reasoning and the fields that \
             action needs. Use element_id values exactly as listed above."
                .to_string(),
        );
        sections.join("\n\n")
    }

    fn element_list(&self, snapshot: &PageSnapshot) -> String {
        if let Some(reason) = &snapshot.error {
            return format!("INTERACTIVE ELEMENTS: unavailable ({reason})");
        }
        let references = snapshot.ordered_references();
        if references.is_empty() {
            return "INTERACTIVE ELEMENTS: none found".to_string();
        }
        let mut block = format!("INTERACTIVE ELEMENTS ({}):", references.len());
        for reference in references.iter().take(self.element_limit) {
            let tag = reference.tag.as_deref().unwrap_or(reference.role.as_str());
            let text = if reference.name.trim().is_empty() {
                reference.value.as_str()
            } else {
                reference.name.as_str()
            };
            block.push_str(&format!("\n[{}] <{}> {}", reference.ref_id, tag, clip(text, ELEMENT_TEXT_CHARS)));
        }
        if references.len() > self.element_limit {
            block.push_str(&format!("\n... {} more not shown", references.len() - self.element_limit));
        }
        block
    }

    fn snapshot_text(&self, snapshot: &PageSnapshot) -> String {
        if snapshot.text.chars().count() <= self.snapshot_chars {
            return snapshot.text.clone();
        }
        let mut text: String = snapshot.text.chars().take(self.snapshot_chars).collect();
        text.push_str("\n... (snapshot truncated)");
        text
    }
}

/// Prompt asking the model to split a goal into ordered sub-tasks.
pub fn planning_prompt(goal: &str, start_url: Option<&str>) -> String {
    let mut prompt = format!("GOAL: {goal}\n");
    if let Some(url) = start_url {
        prompt.push_str(&format!("START URL: {url}\n"));
    }
    prompt.push_str(
        "\nBreak this goal into 2-8 short, ordered browser sub-tasks. Each sub-task is one \
         imperative sentence. If the goal repeats something a number of times, keep the count in \
         the relevant sub-task.\n\nRespond with JSON only:\n\
         {\"steps\": [\"Open the job search page\", \"Search for rust developer\", \"Apply to the first listing\"]}",
    );
    prompt
}

/// One line per registered action: canonical name, fields and purpose.
fn action_list() -> String {
    ACTION_REGISTRY
        .iter()
        .map(|spec| {
            let mut fields: Vec<String> = spec.required.iter().map(|f| f.to_string()).collect();
            fields.extend(spec.optional.iter().map(|f| format!("{f}?")));
            format!("- {}({}): {}", spec.name, fields.join(", "), spec.description)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn clip(value: &str, max: usize) -> String {
    let flat = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        flat
    } else {
        flat.chars().take(max).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perceiver_structural::{ElementReference, LocatorHints, SnapshotSource};

    fn reference(n: usize, name: &str) -> ElementReference {
        ElementReference {
            ref_id: format!("e{n}"),
            role: "link".into(),
            name: name.into(),
            description: String::new(),
            value: String::new(),
            checked: None,
            disabled: false,
            expanded: None,
            tag: Some("a".into()),
            hints: LocatorHints::default(),
        }
    }

    fn snapshot(count: usize, text: String) -> PageSnapshot {
        let refs = (1..=count).map(|n| reference(n, &format!("Link number {n}"))).collect();
        PageSnapshot::from_references("https://example.com", text, refs, SnapshotSource::Dom)
    }

    #[test]
    fn decision_prompt_carries_every_section() {
        let snap = snapshot(2, "- [e1] link \"Link number 1\"".into());
        let history = vec!["step 1: reload -> ok".to_string()];
        let prompt = PromptBuilder::default().decision_prompt(&PromptContext {
            goal: "open the second link",
            url: "https://example.com",
            snapshot: &snap,
            memory: "CURRENT STEP: 1/2 - find the link",
            history: &history,
        });

        for marker in [
            "GOAL: open the second link",
            "CURRENT URL: https://example.com",
            "CURRENT STEP: 1/2",
            "PREVIOUS STEPS:\n- step 1: reload -> ok",
            "[e2] <a> Link number 2",
            "PAGE SNAPSHOT:",
            "- click(element_id):",
            "- terminate(errors?):",
            "\"action_type\": \"complete\"",
        ] {
            assert!(prompt.contains(marker), "missing {marker:?}");
        }
    }

    #[test]
    fn element_list_and_snapshot_are_capped() {
        let snap = snapshot(120, "x".repeat(20_000));
        let prompt = PromptBuilder::default().decision_prompt(&PromptContext {
            goal: "g",
            url: "u",
            snapshot: &snap,
            memory: "",
            history: &[],
        });
        assert!(prompt.contains("[e100] <a>"));
        assert!(!prompt.contains("[e101] <a>"));
        assert!(prompt.contains("20 more not shown"));
        assert!(prompt.contains("(snapshot truncated)"));
        assert!(!prompt.contains(&"x".repeat(15_001)));
    }

    #[test]
    fn element_text_is_clipped() {
        assert_eq!(clip(&"a".repeat(80), ELEMENT_TEXT_CHARS).len(), 50);
        assert_eq!(clip("  Sign \n in  ", 50), "Sign in");
    }

    #[test]
    fn planning_prompt_mentions_goal_and_url() {
        let prompt = planning_prompt("apply to 3 jobs", Some("https://jobs.example.com"));
        assert!(prompt.contains("GOAL: apply to 3 jobs"));
        assert!(prompt.contains("START URL: https://jobs.example.com"));
        assert!(prompt.contains("\"steps\""));
    }
}
