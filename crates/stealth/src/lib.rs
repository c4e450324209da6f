//! Automation fingerprint masking.
//!
//! A [`StealthProfile`] contributes Chromium launch flags and an init script that runs before
//! any page script, hiding the most common automation tells.

pub mod config;

use cdp_adapter::{AdapterError, PageDriver};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StealthError {
    #[error("failed to install stealth script: {0}")]
    Inject(#[from] AdapterError),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StealthProfile {
    pub name: String,
    pub hide_webdriver: bool,
    pub fake_plugins: bool,
    pub chrome_runtime: bool,
    pub languages: Vec<String>,
    /// Extra launch flags appended after the built-in set.
    pub extra_args: Vec<String>,
}

impl Default for StealthProfile {
    fn default() -> Self {
        Self {
            name: "default".into(),
            hide_webdriver: true,
            fake_plugins: true,
            chrome_runtime: true,
            languages: vec!["en-US".into(), "en".into()],
            extra_args: Vec::new(),
        }
    }
}

const BASE_ARGS: &[&str] = &[
    "--disable-blink-features=AutomationControlled",
    "--disable-infobars",
    "--disable-dev-shm-usage",
    "--no-first-run",
    "--no-default-browser-check",
    "--disable-background-networking",
    "--disable-sync",
    "--disable-translate",
    "--disable-features=IsolateOrigins,site-per-process",
];

impl StealthProfile {
    pub fn launch_args(&self) -> Vec<String> {
        let mut args: Vec<String> = BASE_ARGS.iter().map(|arg| arg.to_string()).collect();
        if let Some(primary) = self.languages.first() {
            args.push(format!("--lang={primary}"));
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }

    /// Script registered to run on every new document.
    pub fn init_script(&self) -> String {
        let mut script = String::new();
        if self.hide_webdriver {
            script.push_str(
                "Object.defineProperty(navigator, 'webdriver', { get: () => undefined, configurable: true });\n",
            );
        }
        if self.fake_plugins {
            script.push_str(
                "Object.defineProperty(navigator, 'plugins', { get: () => [\
{ name: 'Chrome PDF Plugin', filename: 'internal-pdf-viewer', description: 'Portable Document Format' },\
{ name: 'Chrome PDF Viewer', filename: 'mhjfbmdgcfjbbpaeojofohoefgiehjai', description: '' },\
{ name: 'Native Client', filename: 'internal-nacl-plugin', description: '' }\
], configurable: true });\n",
            );
        }
        if !self.languages.is_empty() {
            let quoted: Vec<String> = self
                .languages
                .iter()
                .map(|lang| format!("'{}'", lang.replace('\'', "")))
                .collect();
            script.push_str(&format!(
                "Object.defineProperty(navigator, 'languages', {{ get: () => [{}], configurable: true }});\n",
                quoted.join(", ")
            ));
        }
        if self.chrome_runtime {
            script.push_str(
                "window.chrome = window.chrome || { runtime: {}, loadTimes: function() {}, csi: function() {}, app: {} };\n",
            );
        }
        script
    }

    pub async fn apply(&self, page: &dyn PageDriver) -> Result<(), StealthError> {
        let script = self.init_script();
        if script.is_empty() {
            return Ok(());
        }
        page.add_init_script(&script).await?;
        debug!(profile = %self.name, "Stealth init script installed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdp_adapter::fake::FakePage;

    #[test]
    fn launch_args_disable_automation_flag() {
        let args = StealthProfile::default().launch_args();
        assert!(args.contains(&"--disable-blink-features=AutomationControlled".to_string()));
        assert!(args.contains(&"--lang=en-US".to_string()));
    }

    #[test]
    fn disabled_features_are_left_out_of_the_script() {
        let profile = StealthProfile {
            fake_plugins: false,
            chrome_runtime: false,
            languages: Vec::new(),
            ..StealthProfile::default()
        };
        let script = profile.init_script();
        assert!(script.contains("'webdriver'"));
        assert!(!script.contains("plugins"));
        assert!(!script.contains("window.chrome"));
    }

    #[tokio::test]
    async fn apply_registers_one_init_script() {
        let page = FakePage::new("about:blank");
        StealthProfile::default().apply(&page).await.expect("apply");
        let scripts = page.init_scripts();
        assert_eq!(scripts.len(), 1);
        assert!(scripts[0].contains("navigator, 'languages'"));
    }
}
