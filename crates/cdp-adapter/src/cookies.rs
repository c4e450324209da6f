//! File-backed cookie store.
//!
//! A directory holds one JSON array of cookies per site. The file stem is matched against
//! the goal and start URL, so `linkedin.json` is loaded for any goal mentioning LinkedIn.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum CookieError {
    #[error("cannot access cookie file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cookie file {path} is not a JSON cookie array: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl CookieError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<f64>,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
            url: None,
            secure: None,
            http_only: None,
            expires: None,
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }
}

#[derive(Clone, Debug)]
pub struct CookieStore {
    dir: PathBuf,
}

impl CookieStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cookies from every file whose stem appears in the goal or URL.
    ///
    /// A missing directory yields nothing. Unreadable files are logged and skipped.
    pub fn matching(&self, goal: &str, url: Option<&str>) -> Vec<Cookie> {
        let haystack = format!("{} {}", goal, url.unwrap_or_default()).to_lowercase();
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) => {
                debug!(dir = %self.dir.display(), error = %err, "Cookie directory unavailable");
                return Vec::new();
            }
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("json"))
            .collect();
        files.sort();

        let mut cookies = Vec::new();
        for path in files {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if stem.is_empty() || !haystack.contains(&stem.to_lowercase()) {
                continue;
            }
            match load_file(&path) {
                Ok(mut loaded) => {
                    debug!(file = %path.display(), count = loaded.len(), "Loaded cookies");
                    cookies.append(&mut loaded);
                }
                Err(err) => {
                    warn!(file = %path.display(), error = %err, "Skipping unreadable cookie file");
                }
            }
        }
        cookies
    }

    pub fn save(&self, site: &str, cookies: &[Cookie]) -> Result<PathBuf, CookieError> {
        fs::create_dir_all(&self.dir).map_err(|err| CookieError::io(&self.dir, err))?;
        let path = self.dir.join(format!("{site}.json"));
        let body = serde_json::to_string_pretty(cookies).map_err(|source| CookieError::Malformed {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, body).map_err(|err| CookieError::io(&path, err))?;
        Ok(path)
    }
}

/// Read one cookie file: a JSON array of [`Cookie`] objects.
pub fn load_file(path: &Path) -> Result<Vec<Cookie>, CookieError> {
    let raw = fs::read_to_string(path).map_err(|err| CookieError::io(path, err))?;
    serde_json::from_str(&raw).map_err(|source| CookieError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}
