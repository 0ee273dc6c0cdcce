//! Application configuration management.
//!
//! The config file holds the backend URL and request timeout. The API key
//! never goes in the file; it comes from the environment or the OS keychain.
//!
//! Configuration is stored at `~/.config/wardline/config.json`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::client::DEFAULT_TIMEOUT_SECS;
use crate::credentials::KeyStore;

/// Application name used for config/cache directory paths
pub const APP_NAME: &str = "wardline";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the backend URL
pub const ENV_BACKEND_URL: &str = "WARDLINE_BACKEND_URL";

/// Environment variable supplying the API key
pub const ENV_API_KEY: &str = "WARDLINE_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    pub backend_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

/// Everything needed to build the REST client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub backend_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents).with_context(|| format!("Invalid config in {}", path.display()))
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for log files.
    pub fn cache_dir() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir().ok_or_else(|| anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Backend URL from the environment, falling back to the config file.
    pub fn backend_url(&self) -> Option<String> {
        std::env::var(ENV_BACKEND_URL)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.backend_url.clone())
    }

    /// Resolve URL and key. The key comes from the environment, then from
    /// the keychain entry for the resolved URL.
    pub fn connection(&self) -> Result<Connection> {
        let backend_url = self.backend_url().ok_or_else(|| {
            anyhow!(
                "No backend URL configured. Set {} or add backend_url to {}",
                ENV_BACKEND_URL,
                CONFIG_FILE
            )
        })?;

        let api_key = match std::env::var(ENV_API_KEY).ok().filter(|v| !v.trim().is_empty()) {
            Some(key) => key,
            None => KeyStore::get(&backend_url).with_context(|| {
                format!(
                    "No API key for {}. Set {} or run `wardline --store-key`",
                    backend_url, ENV_API_KEY
                )
            })?,
        };

        Ok(Connection {
            backend_url,
            api_key,
            timeout: self.timeout(),
        })
    }
}
