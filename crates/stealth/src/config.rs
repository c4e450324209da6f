//! YAML profile files.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::StealthProfile;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to deserialize stealth profile: {0}")]
    Deserialize(String),
}

/// Load a profile from YAML. Omitted fields keep their defaults.
pub fn load_profile(path: impl AsRef<Path>) -> Result<StealthProfile, ConfigError> {
    let raw = fs::read_to_string(path)?;
    parse_profile(&raw)
}

pub fn parse_profile(raw: &str) -> Result<StealthProfile, ConfigError> {
    serde_yaml::from_str(raw).map_err(|err| ConfigError::Deserialize(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let profile = parse_profile("name: quiet\nfake_plugins: false\n").expect("parse");
        assert_eq!(profile.name, "quiet");
        assert!(!profile.fake_plugins);
        assert!(profile.hide_webdriver);
        assert_eq!(profile.languages, vec!["en-US", "en"]);
    }

    #[test]
    fn malformed_yaml_is_reported() {
        let err = parse_profile("languages: [unterminated").unwrap_err();
        assert!(matches!(err, ConfigError::Deserialize(_)));
    }
}
