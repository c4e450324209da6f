//! Configuration model for the `surfpilot` binary.
//!
//! Every field has a default, so an empty file (or none at all) is a valid configuration.
//! Loading and layering live in [`crate::cli::runtime::load_config`].

use std::path::PathBuf;

use agent_core::{AgentConfig, ModelSettings, SessionPaths};
use cdp_adapter::{detect_chrome_executable, LaunchOptions};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use stealth::StealthProfile;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
(KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfPilotConfig {
    pub browser: BrowserSettings,
    pub llm: ModelSettings,
    pub agent: AgentConfig,
    pub paths: SessionPaths,
    pub logging: LoggingSettings,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub headless: bool,
    /// Chrome binary. Detected from `SURFPILOT_CHROME`, `PATH` and install paths when unset.
    pub executable: Option<PathBuf>,
    pub user_data_dir: Option<PathBuf>,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub user_agent: String,
    pub default_timeout_ms: u64,
    pub navigation_timeout_ms: u64,
    pub stealth: bool,
    /// Optional YAML stealth profile; the built-in profile is used otherwise.
    pub stealth_profile: Option<PathBuf>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            executable: None,
            user_data_dir: None,
            viewport_width: 1280,
            viewport_height: 720,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            default_timeout_ms: 30_000,
            navigation_timeout_ms: 60_000,
            stealth: true,
            stealth_profile: None,
        }
    }
}

impl BrowserSettings {
    pub fn launch_options(&self, stealth: Option<&StealthProfile>) -> LaunchOptions {
        let user_agent = self.user_agent.trim();
        LaunchOptions {
            executable: self.executable.clone().or_else(detect_chrome_executable),
            user_data_dir: self.user_data_dir.clone(),
            headless: self.headless,
            viewport_width: self.viewport_width,
            viewport_height: self.viewport_height,
            user_agent: (!user_agent.is_empty()).then(|| user_agent.to_string()),
            args: stealth.map(StealthProfile::launch_args).unwrap_or_default(),
            default_timeout_ms: self.default_timeout_ms,
            navigation_timeout_ms: self.navigation_timeout_ms,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Human,
    Json,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub format: LogFormat,
    /// Directory for a daily-rolling log file. Console only when unset.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Human,
            file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults_elsewhere() {
        let config: SurfPilotConfig = serde_yaml::from_str(
            "browser:\n  headless: false\nllm:\n  provider: openai\n  model: gpt-4o-mini\nlogging:\n  format: json\n",
        )
        .expect("config");
        assert!(!config.browser.headless);
        assert_eq!(config.browser.viewport_width, 1280);
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.agent.max_steps, 30);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.paths.logs_dir, PathBuf::from("./logs"));
    }

    #[test]
    fn stealth_profile_contributes_launch_args() {
        let settings = BrowserSettings {
            executable: Some(PathBuf::from("/opt/chrome")),
            ..BrowserSettings::default()
        };
        let profile = StealthProfile::default();
        let options = settings.launch_options(Some(&profile));
        assert_eq!(options.executable, Some(PathBuf::from("/opt/chrome")));
        assert!(options
            .args
            .iter()
            .any(|arg| arg == "--disable-blink-features=AutomationControlled"));
        assert!(settings.launch_options(None).args.is_empty());
    }
}
