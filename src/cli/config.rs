use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use serde_json::Value as JsonValue;

use crate::cli::context::CliContext;
use crate::cli::output::{print_structured, OutputFormat};
use crate::cli::runtime::default_config_path;

#[derive(Args, Clone, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Get one configuration value
    Get {
        /// Dotted key, e.g. agent.max_steps
        key: String,
    },

    /// Print the config file location
    Path,
}

pub fn cmd_config(args: ConfigArgs, ctx: &CliContext, output: OutputFormat) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            let json = masked_config(ctx)?;
            if !print_structured(&json, output)? {
                match ctx.config_path() {
                    Some(path) => println!("# Effective configuration ({})", path.display()),
                    None => println!("# Effective configuration (defaults and environment)"),
                }
                print!("{}", serde_yaml::to_string(&json)?);
            }
        }
        ConfigAction::Get { key } => {
            let json = masked_config(ctx)?;
            let segments = split_key(&key)?;
            let Some(value) = get_json_value(&json, &segments) else {
                bail!("{} not found in configuration", key);
            };
            if !print_structured(value, output)? {
                match value {
                    JsonValue::String(text) => println!("{text}"),
                    other => print!("{}", serde_yaml::to_string(other)?),
                }
            }
        }
        ConfigAction::Path => {
            let path = ctx
                .config_path()
                .map(|path| path.to_path_buf())
                .or_else(default_config_path);
            match path {
                Some(path) => println!("{}", path.display()),
                None => bail!("No configuration directory on this platform"),
            }
        }
    }
    Ok(())
}

fn masked_config(ctx: &CliContext) -> Result<JsonValue> {
    let mut json = serde_json::to_value(ctx.config())?;
    if let Some(key) = json.pointer_mut("/llm/api_key") {
        if !key.is_null() {
            *key = JsonValue::String("********".to_string());
        }
    }
    Ok(json)
}

fn split_key(key: &str) -> Result<Vec<&str>> {
    let segments: Vec<&str> = key.split('.').map(str::trim).collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        bail!("Invalid configuration key: {}", key);
    }
    Ok(segments)
}

fn get_json_value<'a>(value: &'a JsonValue, segments: &[&str]) -> Option<&'a JsonValue> {
    segments
        .iter()
        .try_fold(value, |current, segment| current.get(*segment))
}
