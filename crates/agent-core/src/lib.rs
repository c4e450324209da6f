//! SurfPilot agent core.
//!
//! Turns a natural-language goal into a browser session: the planner splits the goal,
//! the orchestrator runs the observe/decide/act loop against a [`cdp_adapter::PageDriver`],
//! and every session leaves a JSON action log that can be listed and replayed.

pub mod action_log;
pub mod errors;
pub mod export;
pub mod llm;
pub mod orchestrator;
pub mod parser;
pub mod planner;
pub mod prompt;
pub mod replay;

pub use action_log::{
    list_sessions, load_session, ActionLogger, LoggedAction, SessionClose, SessionLog,
    SessionStatus, SessionSummary,
};
pub use errors::{AgentError, ModelError};
pub use export::{slugify, Exporter};
pub use llm::{
    build_model, CompletionRequest, LanguageModel, MockLanguageModel, ModelProvider,
    ModelSettings, OllamaClient, OpenAiClient,
};
pub use orchestrator::{AgentConfig, Orchestrator, PageFactory, SessionOutcome, SessionPaths};
pub use parser::{extract_json_object, parse_decision};
pub use planner::{detect_loop, rule_based_plan, GoalPlanner, LoopIntent, Plan, PlanSource};
pub use prompt::{PromptBuilder, PromptContext};
pub use replay::{replay_session, ReplayOptions, ReplayReport, Replayer};
