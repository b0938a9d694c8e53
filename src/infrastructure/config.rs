//! Configuration infrastructure
//!
//! Configuration is stored as one JSON document with four sections:
//! 1. `fetch` - HTTP behavior (timeout, retries, user agent)
//! 2. `module_urls` - which URLs are accepted as module roots
//! 3. `signatures` - structural signatures for navigation, content and chrome
//! 4. `logging` - log level and outputs

#![allow(clippy::derivable_impls)]

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

use crate::domain::module_reference::ModuleUrlPolicy;
use crate::infrastructure::parsing::config::SignatureRules;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub fetch: FetchConfig,
    pub module_urls: ModuleUrlPolicy,
    pub signatures: SignatureRules,
    pub logging: LoggingConfig,
}

/// HTTP fetch behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-request timeout in seconds
    pub timeout_seconds: u64,

    /// Extra attempts after a retryable failure (0 disables retries)
    pub max_retries: u32,

    /// Base delay for exponential backoff between attempts
    pub retry_backoff_ms: u64,

    pub user_agent: String,

    pub follow_redirects: bool,

    /// Upper bound for parallel section prefetching
    pub max_concurrent_sections: usize,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs
    pub json_format: bool,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Directory for log files; defaults to `logs/` next to the executable
    pub log_directory: Option<PathBuf>,

    pub file_name: String,

    /// Module-specific log level filters (e.g., "reqwest": "info")
    pub module_filters: HashMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            module_urls: ModuleUrlPolicy::default(),
            signatures: SignatureRules::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            max_retries: defaults::MAX_RETRIES,
            retry_backoff_ms: defaults::RETRY_BACKOFF_MS,
            user_agent: defaults::USER_AGENT.to_string(),
            follow_redirects: true,
            max_concurrent_sections: defaults::MAX_CONCURRENT_SECTIONS,
        }
    }
}

impl FetchConfig {
    pub const fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            log_directory: None,
            file_name: defaults::LOG_FILE_NAME.to_string(),
            module_filters: {
                let mut filters = HashMap::new();
                filters.insert("reqwest".to_string(), "info".to_string());
                filters.insert("hyper".to_string(), "warn".to_string());
                filters.insert("html5ever".to_string(), "warn".to_string());
                filters.insert("selectors".to_string(), "warn".to_string());
                filters
            },
        }
    }
}

/// Configuration manager for loading and saving settings
pub struct ConfigManager {
    pub config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join(defaults::APP_DIR_NAME);

        Ok(config_dir)
    }

    /// Manager for the per-user configuration file
    pub fn new() -> Result<Self> {
        let config_path = Self::get_config_dir()?.join(defaults::CONFIG_FILE_NAME);
        Ok(Self { config_path })
    }

    /// Manager for an explicit configuration file
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
        }
    }

    /// Load configuration from file, creating default if it doesn't exist
    pub async fn load_config(&self) -> Result<AppConfig> {
        if !self.config_path.exists() {
            info!("Configuration file not found, creating default: {:?}", self.config_path);
            let default_config = AppConfig::default();
            self.save_config(&default_config).await?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .context("Failed to read configuration file")?;

        match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => {
                info!("Loaded configuration from: {:?}", self.config_path);
                Ok(config)
            }
            Err(parse_error) => {
                warn!("⚠️  Configuration file is invalid: {}", parse_error);

                let backup_path = self.config_path.with_extension("json.corrupted");
                if let Err(e) = fs::copy(&self.config_path, &backup_path).await {
                    warn!("Failed to create backup of corrupted config: {}", e);
                } else {
                    info!("Backed up corrupted config to: {:?}", backup_path);
                }

                let default_config = AppConfig::default();
                self.save_config(&default_config)
                    .await
                    .context("Failed to save default configuration")?;
                info!("✅ Reset to default configuration");
                Ok(default_config)
            }
        }
    }

    /// Save configuration to file
    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;

        fs::write(&self.config_path, content)
            .await
            .context("Failed to write configuration file")?;

        info!("Saved configuration to: {:?}", self.config_path);
        Ok(())
    }

    /// Update fetch settings in place
    pub async fn update_fetch_config<F>(&self, updater: F) -> Result<()>
    where
        F: FnOnce(&mut FetchConfig),
    {
        let mut config = self.load_config().await?;
        updater(&mut config.fetch);
        self.save_config(&config).await
    }

    /// Reset configuration to defaults (useful for troubleshooting)
    pub async fn reset_to_defaults(&self) -> Result<AppConfig> {
        info!("🔄 Resetting configuration to defaults");
        let default_config = AppConfig::default();
        self.save_config(&default_config).await?;
        Ok(default_config)
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

/// Training site URLs and structural constants
pub mod learn_site {
    /// Hosts serving training modules
    pub const HOSTS: &[&str] = &["learn.microsoft.com", "docs.microsoft.com"];

    /// Path fragments that identify a module index
    pub const MODULE_PATH_MARKERS: &[&str] = &["/training/modules/", "/learn/modules/"];

    /// Module loaded when the caller does not name one
    pub const DEFAULT_MODULE_URL: &str = "https://learn.microsoft.com/en-us/training/modules/get-started-data-warehouse/";
}

/// Default configuration values
pub mod defaults {
    pub const APP_DIR_NAME: &str = "learn-module-reader";

    pub const CONFIG_FILE_NAME: &str = "config.json";

    /// Default request timeout in seconds
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 10;

    /// Default extra attempts for retryable failures
    pub const MAX_RETRIES: u32 = 2;

    pub const RETRY_BACKOFF_MS: u64 = 500;

    /// Browser user agent; the training site serves reduced markup to unknown agents
    pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

    pub const MAX_CONCURRENT_SECTIONS: usize = 4;

    // Log configuration defaults
    pub const LOG_LEVEL: &str = "info";

    pub const LOG_JSON_FORMAT: bool = false;

    pub const LOG_CONSOLE_OUTPUT: bool = true;

    pub const LOG_FILE_OUTPUT: bool = false;

    pub const LOG_FILE_NAME: &str = "module-reader.log";
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_creates_default_file() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("nested").join("config.json"));

        let config = manager.load_config().await.unwrap();
        assert!(manager.config_path().exists());
        assert_eq!(config.fetch.timeout_seconds, defaults::REQUEST_TIMEOUT_SECONDS);
        assert_eq!(config.module_urls, ModuleUrlPolicy::default());
    }

    #[tokio::test]
    async fn test_round_trip_keeps_updates() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("config.json"));

        manager
            .update_fetch_config(|fetch| {
                fetch.timeout_seconds = 3;
                fetch.max_retries = 0;
            })
            .await
            .unwrap();

        let config = manager.load_config().await.unwrap();
        assert_eq!(config.fetch.timeout_seconds, 3);
        assert_eq!(config.fetch.max_retries, 0);
    }

    #[tokio::test]
    async fn test_reset_discards_saved_changes() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("config.json"));
        manager
            .update_fetch_config(|fetch| fetch.max_concurrent_sections = 16)
            .await
            .unwrap();

        let reset = manager.reset_to_defaults().await.unwrap();
        assert_eq!(reset.fetch.max_concurrent_sections, defaults::MAX_CONCURRENT_SECTIONS);
        let reloaded = manager.load_config().await.unwrap();
        assert_eq!(reloaded.fetch.max_concurrent_sections, defaults::MAX_CONCURRENT_SECTIONS);
    }

    #[tokio::test]
    async fn test_partial_file_falls_back_to_section_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "fetch": { "timeout_seconds": 25 } }"#).unwrap();

        let config = ConfigManager::with_path(&path).load_config().await.unwrap();
        assert_eq!(config.fetch.timeout_seconds, 25);
        assert_eq!(config.fetch.max_retries, defaults::MAX_RETRIES);
        assert!(!config.signatures.navigation.container.is_empty());
    }

    #[tokio::test]
    async fn test_corrupted_file_is_backed_up_and_reset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let config = ConfigManager::with_path(&path).load_config().await.unwrap();
        assert_eq!(config.fetch.timeout_seconds, defaults::REQUEST_TIMEOUT_SECONDS);
        assert!(dir.path().join("config.json.corrupted").exists());
    }
}
