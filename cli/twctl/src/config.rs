//! Configuration.
//!
//! Handles:
//! - Default output format
//! - Log level
//! - Where ledgers are kept when `--ledger` is not given

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::logging::DEFAULT_LOG_LEVEL;

/// Configuration file name.
const CONFIG_FILE: &str = "config.json";

/// Get the config directory path.
fn config_dir() -> Result<PathBuf> {
    ProjectDirs::from("com", "kaitet", "taskwork")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
}

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Output format used when `--format` is not given.
    #[serde(default = "default_format")]
    pub format: String,

    /// Log level used when neither `RUST_LOG` nor `TW_LOG` is set.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory for ledgers of plans run without `--ledger`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger_dir: Option<PathBuf>,
}

fn default_format() -> String {
    "table".to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            format: default_format(),
            log_level: default_log_level(),
            ledger_dir: None,
        }
    }
}

impl Config {
    /// Load config from the user config directory, or return default.
    pub fn load() -> Result<Self> {
        let path = config_dir()?.join(CONFIG_FILE);
        Self::load_from(&path)
    }

    /// Load config from a specific file, or return default if it is missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {:?}", path))
    }

    /// Ledger path for a plan file when none was given explicitly.
    ///
    /// `plans/week-12.toml` maps to `<ledger_dir>/week-12.json` when a ledger
    /// directory is configured, and to `plans/week-12.ledger.json` otherwise.
    pub fn default_ledger_path(&self, plan_path: &Path) -> PathBuf {
        let stem = plan_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("plan");

        match &self.ledger_dir {
            Some(dir) => dir.join(format!("{stem}.json")),
            None => plan_path.with_file_name(format!("{stem}.ledger.json")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.format, "table");
        assert_eq!(config.log_level, "warn");
        assert!(config.ledger_dir.is_none());
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "format": "json", "ledger_dir": "/srv/ledgers" }"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.format, "json");
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.ledger_dir, Some(PathBuf::from("/srv/ledgers")));
    }

    #[test]
    fn test_default_ledger_path() {
        let mut config = Config::default();
        let plan = Path::new("plans/week-12.toml");
        assert_eq!(
            config.default_ledger_path(plan),
            PathBuf::from("plans/week-12.ledger.json")
        );

        config.ledger_dir = Some(PathBuf::from("/srv/ledgers"));
        assert_eq!(
            config.default_ledger_path(plan),
            PathBuf::from("/srv/ledgers/week-12.json")
        );
    }
}
