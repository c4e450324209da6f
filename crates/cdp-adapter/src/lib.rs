//! SurfPilot page driver layer.
//!
//! Higher layers talk to a live page only through the [`PageDriver`] trait. The crate ships
//! a Chromium implementation over the DevTools Protocol, an in-memory [`fake::FakePage`]
//! for browser-free tests, and the file-backed cookie store used at session start.

use std::{env, path::PathBuf};

use which::which;

mod chromium;
pub mod cookies;
mod driver;
pub mod fake;
mod scripts;

pub use chromium::ChromiumDriver;
pub use config::LaunchOptions;
pub use cookies::{Cookie, CookieError, CookieStore};
pub use driver::{AxNode, ClickMode, ElementHandle, ElementQuery, PageDriver, ScrollTo};
pub use error::{AdapterError, AdapterErrorKind};

pub mod error {
    use serde::{Deserialize, Serialize};
    use std::fmt;
    use thiserror::Error;

    /// High-level error categories surfaced by a page driver.
    #[derive(Clone, Copy, Debug, Error, Eq, PartialEq, Serialize, Deserialize)]
    pub enum AdapterErrorKind {
        #[error("operation timed out")]
        Timeout,
        #[error("cdp i/o failure")]
        CdpIo,
        #[error("target element not found")]
        TargetNotFound,
        #[error("target element not interactable")]
        NotInteractable,
        #[error("option not found")]
        OptionNotFound,
        #[error("browser launch failed")]
        Launch,
        #[error("internal error")]
        Internal,
    }

    /// Enriched error metadata passed back to higher layers.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct AdapterError {
        pub kind: AdapterErrorKind,
        pub hint: Option<String>,
    }

    impl fmt::Display for AdapterError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.kind)?;
            if let Some(hint) = &self.hint {
                write!(f, ": {}", hint)?;
            }
            Ok(())
        }
    }

    impl std::error::Error for AdapterError {}

    impl AdapterError {
        pub fn new(kind: AdapterErrorKind) -> Self {
            Self { kind, hint: None }
        }

        pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
            self.hint = Some(hint.into());
            self
        }

        pub fn io(hint: impl Into<String>) -> Self {
            Self::new(AdapterErrorKind::CdpIo).with_hint(hint)
        }

        pub fn not_found(hint: impl Into<String>) -> Self {
            Self::new(AdapterErrorKind::TargetNotFound).with_hint(hint)
        }

        pub fn timeout(hint: impl Into<String>) -> Self {
            Self::new(AdapterErrorKind::Timeout).with_hint(hint)
        }

        pub fn is_timeout(&self) -> bool {
            self.kind == AdapterErrorKind::Timeout
        }
    }
}

pub mod config {
    use crate::detect_chrome_executable;
    use serde::{Deserialize, Serialize};
    use std::path::PathBuf;

    /// Launch parameters for [`crate::ChromiumDriver`].
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct LaunchOptions {
        pub executable: Option<PathBuf>,
        pub user_data_dir: Option<PathBuf>,
        pub headless: bool,
        pub viewport_width: u32,
        pub viewport_height: u32,
        pub user_agent: Option<String>,
        pub args: Vec<String>,
        pub default_timeout_ms: u64,
        pub navigation_timeout_ms: u64,
    }

    impl Default for LaunchOptions {
        fn default() -> Self {
            Self {
                executable: detect_chrome_executable(),
                user_data_dir: None,
                headless: true,
                viewport_width: 1280,
                viewport_height: 720,
                user_agent: None,
                args: Vec::new(),
                default_timeout_ms: 30_000,
                navigation_timeout_ms: 60_000,
            }
        }
    }
}

/// Locate a Chrome/Chromium binary: `SURFPILOT_CHROME`, then `PATH`, then OS install paths.
pub fn detect_chrome_executable() -> Option<PathBuf> {
    if let Ok(raw) = env::var("SURFPILOT_CHROME") {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            let candidate = PathBuf::from(trimmed);
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    for name in chrome_executable_names() {
        if let Ok(path) = which(name) {
            return Some(path);
        }
    }

    os_specific_chrome_paths()
        .into_iter()
        .find(|candidate| candidate.exists())
}

fn chrome_executable_names() -> &'static [&'static str] {
    #[cfg(target_os = "windows")]
    {
        &["chrome.exe", "chromium.exe", "msedge.exe"]
    }

    #[cfg(not(target_os = "windows"))]
    {
        &[
            "google-chrome-stable",
            "google-chrome",
            "chromium",
            "chromium-browser",
        ]
    }
}

fn os_specific_chrome_paths() -> Vec<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        ["ProgramFiles", "ProgramFiles(x86)", "LocalAppData"]
            .iter()
            .filter_map(|var| env::var(var).ok())
            .map(PathBuf::from)
            .map(|root| root.join("Google/Chrome/Application/chrome.exe"))
            .collect()
    }

    #[cfg(target_os = "macos")]
    {
        vec![
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"),
            PathBuf::from("/Applications/Chromium.app/Contents/MacOS/Chromium"),
        ]
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        vec![
            PathBuf::from("/usr/bin/google-chrome"),
            PathBuf::from("/usr/bin/chromium"),
            PathBuf::from("/usr/bin/chromium-browser"),
            PathBuf::from("/snap/bin/chromium"),
        ]
    }
}
