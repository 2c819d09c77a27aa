//! Configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::monitor::RegionSettings;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub log_level: Option<String>,

    /// Hunt definition file; the built-in hunt is used when unset
    pub hunt_path: Option<PathBuf>,

    /// Region registration parameters
    pub region: RegionSettings,

    /// Storage configuration
    pub storage: StorageConfig,
}

/// Where progress is kept
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub progress_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            progress_path: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("treasurehunt")
                .join("progress.json"),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Project-local config: .treasurehunt.yml
        let local_config = PathBuf::from(".treasurehunt.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // User config: ~/.config/treasurehunt/treasurehunt.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("treasurehunt").join("treasurehunt.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        Ok(Self::default())
    }

    /// Read just the log level so logging can start before the full load
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::load(config_path).ok().and_then(|c| c.log_level)
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
