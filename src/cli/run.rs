use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use tracing::{info, warn};

use agent_core::{build_model, ModelProvider, Orchestrator, SessionOutcome};

use crate::browser::ChromiumPageFactory;
use crate::cli::context::CliContext;
use crate::cli::output::{print_structured, OutputFormat};
use crate::config::SurfPilotConfig;

#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// What the agent should accomplish
    pub goal: String,

    /// Page to open before the first step
    #[arg(long)]
    pub url: Option<String>,

    /// Step budget for this session
    #[arg(long)]
    pub max_steps: Option<u32>,

    /// Run the browser without a window
    #[arg(long, conflicts_with = "headful")]
    pub headless: bool,

    /// Show the browser window
    #[arg(long)]
    pub headful: bool,

    /// Model backend
    #[arg(long, value_enum)]
    pub provider: Option<ProviderArg>,

    /// Model name
    #[arg(long)]
    pub model: Option<String>,

    /// Model endpoint
    #[arg(long)]
    pub base_url: Option<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ProviderArg {
    Ollama,
    Openai,
}

impl From<ProviderArg> for ModelProvider {
    fn from(value: ProviderArg) -> Self {
        match value {
            ProviderArg::Ollama => ModelProvider::Ollama,
            ProviderArg::Openai => ModelProvider::OpenAi,
        }
    }
}

impl RunArgs {
    fn apply(&self, config: &mut SurfPilotConfig) {
        if let Some(max_steps) = self.max_steps {
            config.agent.max_steps = max_steps;
        }
        if self.headless {
            config.browser.headless = true;
        }
        if self.headful {
            config.browser.headless = false;
        }
        if let Some(provider) = self.provider {
            config.llm.provider = provider.into();
        }
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
        if let Some(base_url) = &self.base_url {
            config.llm.base_url = base_url.clone();
        }
    }
}

pub async fn cmd_run(args: RunArgs, ctx: &CliContext, output: OutputFormat) -> Result<()> {
    let mut config = ctx.config().clone();
    args.apply(&mut config);

    let model = build_model(&config.llm).context("Failed to configure the language model")?;
    if !model.health_check().await {
        warn!(model = %model.name(), base_url = %config.llm.base_url, "Model backend did not answer the health check");
    }

    info!(goal = %args.goal, url = ?args.url, max_steps = config.agent.max_steps, "Starting session");
    let pages = Arc::new(ChromiumPageFactory::new(config.browser.clone()));
    let orchestrator = Orchestrator::new(model, pages, config.agent.clone(), config.paths.clone());
    let outcome = orchestrator.run(&args.goal, args.url.as_deref()).await;

    if !print_structured(&outcome, output)? {
        print_outcome(&outcome);
    }
    if !outcome.succeeded() {
        bail!("Session {} ended with status {}", outcome.session_id, outcome.status);
    }
    Ok(())
}

fn print_outcome(outcome: &SessionOutcome) {
    println!("Session:  {}", outcome.session_id);
    println!("Status:   {}", outcome.status);
    println!("Message:  {}", outcome.message);
    println!(
        "Steps:    {} in {:.1}s",
        outcome.steps,
        outcome.duration_ms as f64 / 1000.0
    );
    if let Some(target) = outcome.loop_target {
        println!("Loop:     {}/{}", outcome.loop_counter, target);
    }
    if let Some(path) = &outcome.log_path {
        println!("Log:      {}", path.display());
    }
    for artifact in &outcome.artifacts {
        println!("Artifact: {}", artifact.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        run: RunArgs,
    }

    #[test]
    fn flags_override_config() {
        let harness = Harness::parse_from([
            "surfpilot",
            "find jobs",
            "--max-steps",
            "4",
            "--headful",
            "--provider",
            "openai",
            "--model",
            "gpt-4o-mini",
        ]);
        let mut config = SurfPilotConfig::default();
        harness.run.apply(&mut config);
        assert_eq!(harness.run.goal, "find jobs");
        assert_eq!(config.agent.max_steps, 4);
        assert!(!config.browser.headless);
        assert_eq!(config.llm.provider, ModelProvider::OpenAi);
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.base_url, "http://localhost:11434");
    }

    #[test]
    fn headless_and_headful_conflict() {
        assert!(Harness::try_parse_from(["surfpilot", "goal", "--headless", "--headful"]).is_err());
    }
}
