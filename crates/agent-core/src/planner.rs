//! Goal decomposition.
//!
//! The model is asked for an ordered list of sub-tasks first. If that fails for any reason
//! the goal is planned from keywords instead, so a session always starts with a plan.
//! Independently of the plan, explicit repetition counts ("apply to 5 jobs") become a loop
//! target that gates completion.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use surfpilot_core_types::LogCategory;
use tracing::{info, warn, Instrument};

use crate::llm::{CompletionRequest, LanguageModel};
use crate::parser::extract_json_object;
use crate::prompt::{planning_prompt, SYSTEM_PROMPT};

static LOOP_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+)\s+(times|jobs|posts|items|applications)").expect("loop count regex")
});

/// "click Login 3 times", "press the Like button 5 times".
static CLICK_OBJECT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\b(?:click|press|tap|hit)\s+(?:on\s+)?(?:the\s+)?["']?(.+?)["']?\s+(?:button\s+|link\s+)?\d+\s+(?:times|jobs|posts|items|applications)"#)
        .expect("click object regex")
});

const MAX_PLAN_STEPS: usize = 12;

/// An explicit repetition count found in the goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopIntent {
    pub target: u32,
    /// Counted noun as written: `times`, `jobs`, `applications`.
    pub subject: String,
    /// What is being clicked, when the goal names it ("Login" in "click Login 3 times").
    pub object: Option<String>,
}

impl LoopIntent {
    /// Lowercase terms an element name must contain for a click to count toward the loop.
    pub fn qualifying_terms(&self) -> Vec<String> {
        let mut terms = Vec::new();
        if let Some(object) = &self.object {
            terms.push(object.to_lowercase());
        }
        let subject = self.subject.to_lowercase();
        if subject != "times" {
            terms.push(subject.trim_end_matches('s').to_string());
        }
        terms
    }
}

/// Find the first explicit repetition count in `goal`.
pub fn detect_loop(goal: &str) -> Option<LoopIntent> {
    let captures = LOOP_PATTERN.captures(goal)?;
    let target: u32 = captures.get(1)?.as_str().parse().ok()?;
    if target == 0 {
        return None;
    }
    let subject = captures.get(2)?.as_str().to_lowercase();
    let object = CLICK_OBJECT_PATTERN
        .captures(goal)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|object| !object.is_empty());
    Some(LoopIntent {
        target,
        subject,
        object,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanSource {
    Model,
    RuleBased,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub steps: Vec<String>,
    pub loop_intent: Option<LoopIntent>,
    pub source: PlanSource,
}

/// Asks the model for a plan, with a keyword fallback.
pub struct GoalPlanner {
    model: Arc<dyn LanguageModel>,
}

impl GoalPlanner {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    pub async fn plan(&self, goal: &str, start_url: Option<&str>) -> Plan {
        let loop_intent = detect_loop(goal);
        let request = CompletionRequest::new(planning_prompt(goal, start_url))
            .with_system(SYSTEM_PROMPT)
            .with_temperature(0.3);

        let from_model = async {
            match self.model.complete(&request).await {
                Ok(raw) => parse_plan(&raw),
                Err(err) => Err(err.to_string()),
            }
        }
        .instrument(LogCategory::Llm.span("planner"))
        .await;

        let (steps, source) = match from_model {
            Ok(steps) => (steps, PlanSource::Model),
            Err(reason) => {
                warn!(reason = %reason, "Planning failed; using rule-based plan");
                (rule_based_plan(goal), PlanSource::RuleBased)
            }
        };
        info!(
            steps = steps.len(),
            source = ?source,
            loop_target = loop_intent.as_ref().map(|intent| intent.target),
            "Plan ready"
        );
        Plan {
            steps,
            loop_intent,
            source,
        }
    }
}

/// Accepts `{"steps": [...]}` or `{"tasks": [...]}` where entries are strings or objects
/// with a `description`/`step`/`task` field.
pub fn parse_plan(raw: &str) -> Result<Vec<String>, String> {
    let json = extract_json_object(raw).ok_or("plan response contained no JSON object")?;
    let value: Value = serde_json::from_str(&json).map_err(|err| format!("plan JSON invalid: {err}"))?;
    let entries = ["steps", "tasks", "plan"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_array))
        .ok_or("plan JSON has no steps array")?;

    let steps: Vec<String> = entries
        .iter()
        .filter_map(|entry| match entry {
            Value::String(text) => Some(text.trim().to_string()),
            Value::Object(obj) => ["description", "step", "task", "title"]
                .iter()
                .find_map(|key| obj.get(*key).and_then(Value::as_str))
                .map(|text| text.trim().to_string()),
            _ => None,
        })
        .filter(|step| !step.is_empty())
        .take(MAX_PLAN_STEPS)
        .collect();

    if steps.is_empty() {
        return Err("plan JSON has an empty steps array".to_string());
    }
    Ok(steps)
}

/// Keyword-driven plan used when the model cannot produce one.
pub fn rule_based_plan(goal: &str) -> Vec<String> {
    let lower = goal.to_lowercase();
    let mut steps = vec!["Open the target website".to_string()];

    if lower.contains("login") || lower.contains("log in") || lower.contains("sign in") {
        steps.push("Open the login form".to_string());
        steps.push("Enter the credentials and submit".to_string());
    }
    if lower.contains("job") || lower.contains("apply") {
        steps.push("Search for matching job listings".to_string());
        steps.push("Open a listing and start the application".to_string());
        steps.push("Submit the application".to_string());
    } else if lower.contains("search") {
        steps.push("Locate the search box".to_string());
        steps.push("Search for the requested terms".to_string());
        steps.push("Review the results".to_string());
    }
    if lower.contains("extract") || lower.contains("find") {
        steps.push("Locate the requested information".to_string());
        steps.push("Extract the data".to_string());
    }
    if steps.len() == 1 {
        steps.push(format!("Work toward the goal: {goal}"));
    }
    steps.push("Confirm the goal is complete".to_string());
    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLanguageModel;

    #[test]
    fn detects_repetition_counts() {
        let intent = detect_loop("Apply to 5 jobs on the board").expect("loop");
        assert_eq!(intent.target, 5);
        assert_eq!(intent.subject, "jobs");
        assert_eq!(intent.qualifying_terms(), vec!["job".to_string()]);

        let intent = detect_loop("click Login 3 times").expect("loop");
        assert_eq!(intent.target, 3);
        assert_eq!(intent.object.as_deref(), Some("Login"));
        assert_eq!(intent.qualifying_terms(), vec!["login".to_string()]);

        assert!(detect_loop("search for rust books").is_none());
        assert!(detect_loop("wait 0 times").is_none());
    }

    #[test]
    fn click_object_ignores_articles_and_button_suffix() {
        let intent = detect_loop("Press the \"Like\" button 4 times").expect("loop");
        assert_eq!(intent.object.as_deref(), Some("Like"));
    }

    #[test]
    fn parses_steps_in_several_shapes() {
        assert_eq!(
            parse_plan(r#"{"steps": ["open site", "search"]}"#).expect("strings"),
            vec!["open site", "search"]
        );
        assert_eq!(
            parse_plan("```json\n{\"tasks\": [{\"action\": \"navigate\", \"description\": \"Go to site\"}]}\n```")
                .expect("tasks"),
            vec!["Go to site"]
        );
        assert!(parse_plan(r#"{"steps": []}"#).is_err());
        assert!(parse_plan("no plan").is_err());
    }

    #[test]
    fn rule_based_plans_follow_keywords() {
        let login = rule_based_plan("Login to example.com");
        assert!(login.iter().any(|step| step.contains("login form")));

        let jobs = rule_based_plan("Apply to rust jobs");
        assert!(jobs.iter().any(|step| step.contains("application")));

        let search = rule_based_plan("search for headphones and extract prices");
        assert!(search.iter().any(|step| step.contains("search box")));
        assert!(search.iter().any(|step| step.contains("Extract")));

        let generic = rule_based_plan("Look around");
        assert_eq!(generic.len(), 3);
        assert_eq!(generic.last().map(String::as_str), Some("Confirm the goal is complete"));
    }

    #[tokio::test]
    async fn falls_back_when_model_output_is_unusable() {
        let model = Arc::new(MockLanguageModel::new(["sure, I can help with that"]));
        let plan = GoalPlanner::new(model).plan("login to the portal", None).await;
        assert_eq!(plan.source, PlanSource::RuleBased);
        assert!(plan.steps.iter().any(|step| step.contains("login form")));
    }

    #[tokio::test]
    async fn uses_model_plan_and_loop_intent() {
        let model = Arc::new(MockLanguageModel::new([r#"{"steps": ["Open jobs", "Apply"]}"#]));
        let plan = GoalPlanner::new(model.clone()).plan("apply to 2 jobs", Some("https://jobs.example.com")).await;
        assert_eq!(plan.source, PlanSource::Model);
        assert_eq!(plan.steps, vec!["Open jobs", "Apply"]);
        assert_eq!(plan.loop_intent.map(|intent| intent.target), Some(2));
        assert!(model.requests()[0].prompt.contains("START URL: https://jobs.example.com"));
    }
}
