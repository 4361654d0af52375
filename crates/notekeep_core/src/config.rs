//! User configuration.
//!
//! Stored as TOML in the platform config directory:
//! - Linux: ~/.config/notekeep/config.toml
//! - macOS: ~/Library/Application Support/notekeep/config.toml
//! - Windows: %APPDATA%\notekeep\config.toml
//!
//! The store treats every field as a read-only input.

use crate::lock::ConflictPolicy;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "notekeep";
const CONFIG_FILE: &str = "config.toml";
const DATA_FILE: &str = "data.txt";
const REGISTRY_FILE: &str = ".notekeep.keys";

pub const DEFAULT_EDITOR: &str = "nano";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Encoded buffer file.
    pub data_file: PathBuf,
    /// Shared advisory lock registry.
    pub registry_file: PathBuf,
    /// Directory for rolling log files.
    pub log_dir: PathBuf,
    /// Log level override; build-mode default when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    /// Editor program used when `--editor` is not given.
    pub editor: String,
    pub conflict_policy: ConflictPolicy,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(APP_DIR);
        Self {
            data_file: data_dir.join(DATA_FILE),
            registry_file: std::env::temp_dir().join(REGISTRY_FILE),
            log_dir: data_dir.join("logs"),
            log_level: None,
            editor: DEFAULT_EDITOR.to_string(),
            conflict_policy: ConflictPolicy::default(),
        }
    }
}

impl Config {
    /// Default location of the config file.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Loads `path`, writing defaults there when it does not exist yet.
    pub fn load_or_init(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            return Ok(config);
        }

        let config = Self::default();
        config.save(path)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

#[derive(Debug)]
pub enum ConfigError {
    /// Platform config directory could not be determined.
    NoConfigDir,
    Io(std::io::Error),
    Parse(toml::de::Error),
    Serialize(toml::ser::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoConfigDir => write!(f, "unable to determine the config directory"),
            Self::Io(err) => write!(f, "config io error: {err}"),
            Self::Parse(err) => write!(f, "invalid config file: {err}"),
            Self::Serialize(err) => write!(f, "unable to write config: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NoConfigDir => None,
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Serialize(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(value: toml::ser::Error) -> Self {
        Self::Serialize(value)
    }
}
