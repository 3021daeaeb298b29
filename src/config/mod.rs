//! Configuration management using the prefer crate for discovery.

mod settings;
mod source;

pub use settings::{ScheduleConfig, Settings, DEFAULT_DATABASE_FILENAME};
pub use source::{
    split_selectors, BrowserKind, ConfigError, RenderConfig, SelectorConfig, SourceConfig,
};

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Configuration file contents. Every field is optional; unset fields keep
/// the [`Settings`] defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Data directory (relative paths resolve against the config file).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Database filename or URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    /// Collections directory (defaults to `<data_dir>/collections`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collections_dir: Option<String>,
    /// User agent; unset for the browser-like default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    /// Delay between requests in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_delay_ms: Option<u64>,
    /// Attempts for transient fetch failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    /// Daily collection schedule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<ScheduleConfig>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers docharvest config files in standard locations.
    pub async fn load() -> Self {
        // Use prefer for file discovery, then parse with serde
        match prefer::load("docharvest").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            tracing::warn!("Ignoring config file {}: {}", path.display(), e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let mut config = Self::parse(&contents, ext)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse config text in the format named by `ext`.
    pub fn parse(contents: &str, ext: &str) -> Result<Self, String> {
        match ext {
            "toml" => toml::from_str(contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e)),
            "yaml" | "yml" => serde_yaml::from_str(contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e)),
            _ => serde_json::from_str(contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e)),
        }
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            let data_dir = self.resolve_path(data_dir, base_dir);
            *settings = Settings {
                schedule: settings.schedule,
                ..Settings::with_data_dir(data_dir)
            };
        }
        if let Some(ref collections_dir) = self.collections_dir {
            settings.collections_dir = self.resolve_path(collections_dir, base_dir);
        }
        if let Some(ref url) = self.database_url {
            settings.database_url = Some(url.clone());
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = Some(user_agent.clone());
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(delay) = self.request_delay_ms {
            settings.request_delay_ms = delay;
        }
        if let Some(retries) = self.max_retries {
            settings.max_retries = retries;
        }
        if let Some(schedule) = self.schedule {
            settings.schedule = schedule;
        }
    }
}

/// Load settings, optionally from an explicit config file.
pub async fn load_settings(config_path: Option<&Path>) -> anyhow::Result<(Settings, Config)> {
    let config = match config_path {
        Some(path) => Config::load_from_path(path)
            .await
            .map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))?,
        None => Config::load().await,
    };

    let base_dir = config
        .base_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings, &base_dir);

    if let Some(data_dir) = std::env::var("DOCHARVEST_DATA_DIR")
        .ok()
        .filter(|s| !s.is_empty())
    {
        tracing::debug!("Using DOCHARVEST_DATA_DIR from environment: {}", data_dir);
        let data_dir = config.resolve_path(&data_dir, &base_dir);
        settings.collections_dir = data_dir.join("collections");
        settings.data_dir = data_dir;
    }

    // DATABASE_URL environment variable takes highest precedence
    if let Some(database_url) = std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()) {
        tracing::debug!("Using DATABASE_URL from environment: {}", database_url);
        settings.database_url = Some(database_url);
    }

    Ok((settings, config))
}
