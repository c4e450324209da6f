use super::config::cmd_config;
use super::env::CliArgs;
use super::replay::cmd_replay;
use super::run::cmd_run;
use super::sessions::cmd_sessions;
use crate::cli::commands::Commands;
use crate::cli::context::CliContext;
use anyhow::Result;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    match cli.command.clone() {
        Commands::Run(args) => cmd_run(args, ctx, cli.output).await,
        Commands::Sessions(args) => cmd_sessions(args, ctx, cli.output),
        Commands::Replay(args) => cmd_replay(args, ctx, cli.output).await,
        Commands::Config(args) => cmd_config(args, ctx, cli.output),
    }
}
