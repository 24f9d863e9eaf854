//! Process configuration.
//!
//! A small YAML file covering what varies between deployments: where
//! the database lives and how loud the logs are. A missing file means
//! defaults; a malformed file is an error.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the SQLite database file.
    pub db_path: PathBuf,
    /// Log verbosity: `error`, `warn`, `info`, `debug`, or `trace`.
    pub log: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            log: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration. With an explicit path the file must exist
    /// and parse; with none, the default location is consulted and a
    /// missing file silently yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let path = default_config_path();
                if path.exists() {
                    Self::from_file(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&raw)?)
    }
}

/// Default database path (`<data dir>/reflex/reflex.db`).
pub fn default_db_path() -> PathBuf {
    data_dir().join("reflex.db")
}

fn default_config_path() -> PathBuf {
    data_dir().join("config.yml")
}

fn data_dir() -> PathBuf {
    let base = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    base.join("reflex")
}
