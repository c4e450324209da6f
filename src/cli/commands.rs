use clap::Subcommand;

use super::config::ConfigArgs;
use super::replay::ReplayArgs;
use super::run::RunArgs;
use super::sessions::SessionsArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Work toward a goal in a fresh browser session
    Run(RunArgs),

    /// List logged sessions, newest first
    Sessions(SessionsArgs),

    /// Replay a logged session without the model
    Replay(ReplayArgs),

    /// Inspect SurfPilot configuration
    Config(ConfigArgs),
}
