//! Launches the Chromium page a session runs on.

use std::sync::Arc;

use agent_core::PageFactory;
use async_trait::async_trait;
use cdp_adapter::{AdapterError, AdapterErrorKind, ChromiumDriver, PageDriver};
use stealth::StealthProfile;
use tracing::{info, warn};

use crate::config::BrowserSettings;

/// One fresh Chromium per [`PageFactory::open`], with the stealth profile applied.
pub struct ChromiumPageFactory {
    settings: BrowserSettings,
    stealth: Option<StealthProfile>,
}

impl ChromiumPageFactory {
    pub fn new(settings: BrowserSettings) -> Self {
        let stealth = settings.stealth.then(|| load_stealth_profile(&settings));
        Self { settings, stealth }
    }

    pub fn settings(&self) -> &BrowserSettings {
        &self.settings
    }
}

fn load_stealth_profile(settings: &BrowserSettings) -> StealthProfile {
    let Some(path) = &settings.stealth_profile else {
        return StealthProfile::default();
    };
    match stealth::config::load_profile(path) {
        Ok(profile) => profile,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Stealth profile unreadable; using the built-in one");
            StealthProfile::default()
        }
    }
}

#[async_trait]
impl PageFactory for ChromiumPageFactory {
    async fn open(&self) -> Result<Arc<dyn PageDriver>, AdapterError> {
        let options = self.settings.launch_options(self.stealth.as_ref());
        if options.executable.is_none() {
            return Err(AdapterError::new(AdapterErrorKind::Launch).with_hint(
                "no Chrome or Chromium executable found; set browser.executable or SURFPILOT_CHROME",
            ));
        }
        let driver: Arc<dyn PageDriver> = Arc::new(ChromiumDriver::launch(&options).await?);
        if let Some(profile) = &self.stealth {
            if let Err(err) = profile.apply(driver.as_ref()).await {
                warn!(error = %err, "Stealth script not installed");
            }
        }
        info!(headless = options.headless, stealth = self.stealth.is_some(), "Browser page ready");
        Ok(driver)
    }
}
