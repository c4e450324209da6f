use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{bail, Context, Result};
use ::config::{Config, Environment, File, FileFormat};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::{LogFormat, LoggingSettings, SurfPilotConfig};

pub const ENV_PREFIX: &str = "SURFPILOT";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

pub struct LoadedConfig {
    pub config: SurfPilotConfig,
    /// The YAML file that was merged in, if one was found.
    pub path: Option<PathBuf>,
}

/// `~/.config/surfpilot/config.yaml` on Linux, the platform equivalent elsewhere.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("surfpilot").join("config.yaml"))
}

/// Layer defaults, an optional YAML file and `SURFPILOT_*` environment variables.
///
/// An explicit `config_path` must exist. Without one the default location is used when
/// present. Nested keys use a double underscore: `SURFPILOT_AGENT__MAX_STEPS=10`.
pub fn load_config(config_path: Option<&Path>) -> Result<LoadedConfig> {
    let path = match config_path {
        Some(path) => {
            if !path.exists() {
                bail!("Config file not found: {}", path.display());
            }
            Some(path.to_path_buf())
        }
        None => default_config_path().filter(|path| path.exists()),
    };

    let mut builder = Config::builder();
    if let Some(path) = &path {
        builder = builder.add_source(File::from(path.as_path()).format(FileFormat::Yaml));
    }
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder
        .build()
        .context("Failed to read configuration")?
        .try_deserialize::<SurfPilotConfig>()
        .context("Failed to parse configuration")?;

    Ok(LoadedConfig { config, path })
}

/// Install the global subscriber. `RUST_LOG` wins over `settings.level`; `debug` forces
/// the debug level.
pub fn init_logging(settings: &LoggingSettings, debug: bool) -> Result<()> {
    let level = if debug {
        "debug".to_string()
    } else {
        settings.level.clone()
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&level))
        .with_context(|| format!("Invalid log level: {level}"))?;

    let console = match settings.format {
        LogFormat::Human => fmt::layer().with_writer(std::io::stderr).boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(std::io::stderr).boxed(),
    };

    let file_layer = match &settings.file {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("surfpilot")
                .filename_suffix("log")
                .build(dir)
                .context("Failed to create log file appender")?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = LOG_GUARD.set(guard);
            Some(fmt::layer().with_ansi(false).with_writer(writer))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    #[serial]
    fn environment_overrides_file_values() {
        let mut file = tempfile::Builder::new()
            .suffix(".yaml")
            .tempfile()
            .expect("temp file");
        writeln!(file, "agent:\n  max_steps: 7\nllm:\n  model: from-file").expect("write");

        std::env::set_var("SURFPILOT_LLM__MODEL", "from-env");
        let loaded = load_config(Some(file.path()));
        std::env::remove_var("SURFPILOT_LLM__MODEL");

        let loaded = loaded.expect("config loads");
        assert_eq!(loaded.path.as_deref(), Some(file.path()));
        assert_eq!(loaded.config.agent.max_steps, 7);
        assert_eq!(loaded.config.llm.model, "from-env");
        assert_eq!(loaded.config.browser.viewport_width, 1280);
    }

    #[test]
    #[serial]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = load_config(Some(&dir.path().join("absent.yaml")))
            .err()
            .expect("missing file");
        assert!(err.to_string().contains("Config file not found"));
    }
}
