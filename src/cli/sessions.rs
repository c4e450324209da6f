use anyhow::{Context, Result};
use clap::Args;

use agent_core::list_sessions;

use crate::cli::context::CliContext;
use crate::cli::output::{print_structured, OutputFormat};

#[derive(Args, Clone, Debug)]
pub struct SessionsArgs {
    /// Maximum number of sessions to list
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

pub fn cmd_sessions(args: SessionsArgs, ctx: &CliContext, output: OutputFormat) -> Result<()> {
    let logs_dir = &ctx.config().paths.logs_dir;
    let mut sessions = list_sessions(logs_dir)
        .with_context(|| format!("Failed to list sessions in {}", logs_dir.display()))?;
    sessions.truncate(args.limit);

    if print_structured(&sessions, output)? {
        return Ok(());
    }
    if sessions.is_empty() {
        println!("No sessions in {}", logs_dir.display());
        return Ok(());
    }
    for session in &sessions {
        println!(
            "{}  {}  {:<16} {:>3} actions  {}",
            session.session_id,
            session.start_time.format("%Y-%m-%d %H:%M:%S"),
            session.status.as_str(),
            session.action_count,
            session.goal
        );
    }
    Ok(())
}
