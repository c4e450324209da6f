use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::{info, warn};

use action_primitives::{ActionExecutor, ExecutorConfig};
use agent_core::{load_session, PageFactory, ReplayOptions, ReplayReport, Replayer};

use crate::browser::ChromiumPageFactory;
use crate::cli::context::CliContext;
use crate::cli::output::{print_structured, OutputFormat};

#[derive(Args, Clone, Debug)]
pub struct ReplayArgs {
    /// Session to replay, e.g. session_1a2b3c4d
    pub session_id: String,

    /// Playback speed multiplier
    #[arg(long, default_value_t = 1.0)]
    pub speed: f64,

    /// Keep going after a failed action
    #[arg(long)]
    pub continue_on_error: bool,

    /// Run the browser without a window
    #[arg(long, conflicts_with = "headful")]
    pub headless: bool,

    /// Show the browser window
    #[arg(long)]
    pub headful: bool,
}

pub async fn cmd_replay(args: ReplayArgs, ctx: &CliContext, output: OutputFormat) -> Result<()> {
    let config = ctx.config();
    let log = load_session(&config.paths.logs_dir, &args.session_id)?;
    info!(session = %log.session_id, actions = log.actions.len(), speed = args.speed, "Replaying session");

    let mut browser = config.browser.clone();
    if args.headless {
        browser.headless = true;
    }
    if args.headful {
        browser.headless = false;
    }
    let page = ChromiumPageFactory::new(browser)
        .open()
        .await
        .context("Failed to open browser page")?;

    let executor_config = ExecutorConfig {
        screenshot_dir: config.paths.screenshots_dir(),
        ..config.agent.executor_config()
    };
    let executor = ActionExecutor::new(page.clone()).with_config(executor_config);
    let options = ReplayOptions {
        speed: args.speed,
        continue_on_error: args.continue_on_error,
    };
    let report = Replayer::new(executor).replay(&log, options).await;
    if let Err(err) = page.close().await {
        warn!(error = %err, "Browser did not close cleanly");
    }
    let report = report?;

    if !print_structured(&report, output)? {
        print_report(&report);
    }
    if !report.all_succeeded() {
        bail!(
            "Replay of {} finished with {}/{} actions succeeded",
            report.session_id,
            report.succeeded,
            report.total
        );
    }
    Ok(())
}

fn print_report(report: &ReplayReport) {
    for (index, result) in report.results.iter().enumerate() {
        let status = if result.success { "ok" } else { "FAILED" };
        match &result.error {
            Some(error) => println!("{:>3}. {:<14} {} ({})", index + 1, result.action.name(), status, error),
            None => println!("{:>3}. {:<14} {}", index + 1, result.action.name(), status),
        }
    }
    println!(
        "Replayed {}: {}/{} succeeded",
        report.session_id, report.succeeded, report.total
    );
}
