//! Application settings.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::repository::DbContext;

/// Default database filename inside the data directory.
pub const DEFAULT_DATABASE_FILENAME: &str = "docharvest.db";

/// Default collections subdirectory name.
const COLLECTIONS_SUBDIR: &str = "collections";

/// Daily collection schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Run the daily collection while serving.
    #[serde(default = "default_schedule_enabled")]
    pub enabled: bool,
    /// Hour of day (UTC, 0-23).
    #[serde(default)]
    pub hour: u32,
    /// Minute of hour (0-59).
    #[serde(default)]
    pub minute: u32,
}

fn default_schedule_enabled() -> bool {
    true
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            hour: 0,
            minute: 0,
        }
    }
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database filename.
    pub database_filename: String,
    /// Database URL (overrides data_dir/database_filename if set).
    /// Set via DATABASE_URL env var or the `database_url` field in config files.
    pub database_url: Option<String>,
    /// Directory for collected Markdown and images.
    pub collections_dir: PathBuf,
    /// User agent for HTTP requests.
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    pub request_timeout: u64,
    /// Delay after each request in milliseconds. Also the backoff step.
    pub request_delay_ms: u64,
    /// Attempts for transient fetch failures.
    pub max_retries: u32,
    /// Daily collection schedule.
    pub schedule: ScheduleConfig,
}

impl Default for Settings {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("docharvest");

        Self {
            collections_dir: data_dir.join(COLLECTIONS_SUBDIR),
            data_dir,
            database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            database_url: None,
            user_agent: None,
            request_timeout: 30,
            request_delay_ms: 1000,
            max_retries: 3,
            schedule: ScheduleConfig::default(),
        }
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            collections_dir: data_dir.join(COLLECTIONS_SUBDIR),
            data_dir,
            ..Default::default()
        }
    }

    /// Get the database URL, constructing from path if not explicitly set.
    pub fn database_url(&self) -> String {
        if let Some(ref url) = self.database_url {
            url.clone()
        } else {
            let path = self.data_dir.join(&self.database_filename);
            format!("sqlite:{}", path.display())
        }
    }

    /// Ensure all directories exist.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        for (dir, label) in [
            (&self.data_dir, "data"),
            (&self.collections_dir, "collections"),
        ] {
            fs::create_dir_all(dir).map_err(|e| {
                std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create {} directory '{}': {}",
                        label,
                        dir.display(),
                        e
                    ),
                )
            })?;
        }
        Ok(())
    }

    /// Create a database context for these settings.
    pub fn create_db_context(&self) -> DbContext {
        DbContext::from_url(&self.database_url())
    }
}
