//! Configuration file support for allergy-risk.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/allergy-risk/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub tables: TablesConfig,

    #[serde(default)]
    pub profile: ProfileConfig,
}

/// Where the risk tables come from
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct TablesConfig {
    /// TOML bundle or CSV directory; built-in defaults when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Inferred from the path when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<TablesFormat>,
}

/// On-disk format of the risk tables
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TablesFormat {
    Toml,
    Csv,
}

impl TablesFormat {
    /// Directories hold CSV sheets; anything else is read as a TOML bundle
    pub fn infer(path: &Path) -> Self {
        if path.is_dir() {
            TablesFormat::Csv
        } else {
            TablesFormat::Toml
        }
    }
}

impl FromStr for TablesFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "toml" => Ok(TablesFormat::Toml),
            "csv" => Ok(TablesFormat::Csv),
            other => Err(Error::Config(format!("unknown table format {:?}", other))),
        }
    }
}

/// Stand-in for the user's stored profile
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct ProfileConfig {
    /// Registered allergens used when a request names none
    #[serde(default)]
    pub allergens: Vec<String>,
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|| PathBuf::from("."))
        });
        base.join("allergy-risk").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
