//! Publisher configuration
//!
//! Settings that change how the publisher gates and sequences a run. Loaded
//! from TOML, falling back to defaults when no file is found.

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable pointing at a config file
pub const CONFIG_ENV: &str = "PUBFLOW_CONFIG";

const DEFAULT_PREFIX: &str = "CL ";
const DEFAULT_PATTERN: &str = r"(?i)^\s*CL\s*\d{6}\b.*";
const DEFAULT_HINT: &str = "Description must start with 'CL' followed by a 6-digit changelist";

/// Publisher settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublisherConfig {
    /// Name shown in headers
    pub display_name: String,
    /// Run validation as the first step of every publish
    pub validate_on_publish: bool,
    /// Every context must link to a pipeline task before publishing
    pub task_required: bool,
    /// Text the summary description is seeded with on each collect
    pub description_prefix: String,
    /// Regular expression a publish description must match
    pub description_pattern: String,
    /// Message shown when the description does not match
    pub description_hint: String,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            display_name: "Publish".to_string(),
            validate_on_publish: true,
            task_required: false,
            description_prefix: DEFAULT_PREFIX.to_string(),
            description_pattern: DEFAULT_PATTERN.to_string(),
            description_hint: DEFAULT_HINT.to_string(),
        }
    }
}

impl PublisherConfig {
    /// Parse a config from TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.description_regex()?;
        Ok(config)
    }

    /// Read a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
        let config = Self::from_toml(&text)?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load the config that applies
    ///
    /// Precedence: `path`, then `$PUBFLOW_CONFIG`, then the user config
    /// directory, then built-in defaults. An explicitly named file must
    /// exist; the user config file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
            return Self::from_file(Path::new(&path));
        }
        if let Some(path) = Self::user_config_path().filter(|p| p.exists()) {
            return Self::from_file(&path);
        }
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// `<config dir>/pubflow/config.toml`
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("pubflow").join("config.toml"))
    }

    /// Compiled description pattern
    pub fn description_regex(&self) -> Result<Regex> {
        Ok(Regex::new(&self.description_pattern)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PublisherConfig::default();
        assert!(config.validate_on_publish);
        assert!(!config.task_required);
        let re = config.description_regex().unwrap();
        assert!(re.is_match("CL 123456 - fix roto"));
        assert!(re.is_match("cl123456"));
        assert!(!re.is_match("CL 12345 - too short"));
        assert!(!re.is_match("CL "));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = PublisherConfig::from_toml("task_required = true\n").unwrap();
        assert!(config.task_required);
        assert!(config.validate_on_publish);
        assert_eq!(config.description_prefix, "CL ");
    }

    #[test]
    fn test_bad_pattern_is_rejected() {
        let err = PublisherConfig::from_toml("description_pattern = \"(unclosed\"\n").unwrap_err();
        assert!(matches!(err, Error::Pattern(_)));
    }
}
