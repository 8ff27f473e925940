//! Application configuration management.
//!
//! Configuration is stored at `~/.config/canteen-tui/config.json` and
//! holds the backend base URL and the last used username. The
//! `CANTEEN_BASE_URL` environment variable overrides the file value.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/data directory paths
const APP_NAME: &str = "canteen-tui";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default Central Server base URL
const DEFAULT_BASE_URL: &str = "https://canteen.example.org/api";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub base_url: Option<String>,
    pub last_username: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Backend base URL: environment override, then config file, then
    /// the built-in default.
    pub fn resolved_base_url(&self) -> String {
        std::env::var("CANTEEN_BASE_URL")
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| self.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Data directory for the local store, avatars, and logs.
    pub fn data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_base_url_used_when_set() {
        let config = Config {
            base_url: Some("https://mensa.example.org/api".to_string()),
            last_username: None,
        };
        // Env override tested separately; absent here in the common case
        if std::env::var("CANTEEN_BASE_URL").is_err() {
            assert_eq!(
                config.resolved_base_url(),
                "https://mensa.example.org/api"
            );
        }
    }

    #[test]
    fn test_default_base_url_when_unset() {
        let config = Config::default();
        if std::env::var("CANTEEN_BASE_URL").is_err() {
            assert_eq!(config.resolved_base_url(), DEFAULT_BASE_URL);
        }
    }
}
