use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::SurfPilotConfig;

pub struct CliContext {
    config: Arc<SurfPilotConfig>,
    config_path: Option<PathBuf>,
}

impl CliContext {
    pub fn new(config: SurfPilotConfig, config_path: Option<PathBuf>) -> Self {
        Self {
            config: Arc::new(config),
            config_path,
        }
    }

    pub fn config(&self) -> &SurfPilotConfig {
        self.config.as_ref()
    }

    /// The YAML file that was merged in, if any.
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}
