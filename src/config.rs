//! Host configuration.
//!
//! Read from a JSON file (`--config`, or `<data_dir>/otpdeck/config.json`).
//! A missing file means defaults. `OTPDECK_STORE` and `OTPDECK_LOG` override
//! the store path and log filter.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const STORE_ENV: &str = "OTPDECK_STORE";
pub const LOG_ENV: &str = "OTPDECK_LOG";

const APP_DIR: &str = "otpdeck";
const CONFIG_FILE: &str = "config.json";
const STORE_FILE: &str = "otp_storage.json";

/// Tracing output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl Default for LogFormat {
    fn default() -> Self {
        if cfg!(feature = "logs-json") {
            Self::Json
        } else {
            Self::Text
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// JSON file holding the ordered OTP URIs.
    pub store_path: PathBuf,
    /// Seconds between code refreshes in `watch`.
    pub refresh_interval_secs: u64,
    /// `EnvFilter` directive, e.g. `info` or `otpdeck_totp=debug`.
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_path: app_data_dir().join(STORE_FILE),
            refresh_interval_secs: otpdeck_totp::totp::DEFAULT_REFRESH_PERIOD.as_secs(),
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
        }
    }
}

/// `<platform data dir>/otpdeck`, or `./otpdeck` when the platform has none.
pub fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

pub fn default_config_path() -> PathBuf {
    app_data_dir().join(CONFIG_FILE)
}

impl AppConfig {
    /// Load from `path` (or the default location), apply environment
    /// overrides, then validate.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
        let mut config = Self::from_file(&path)?;
        config.apply_overrides(std::env::var(STORE_ENV).ok(), std::env::var(LOG_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file. A missing or blank file yields defaults.
    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path).map_err(|source| AppError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(&data).map_err(|source| AppError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Blank values are ignored.
    pub fn apply_overrides(&mut self, store: Option<String>, log: Option<String>) {
        if let Some(store) = store.filter(|s| !s.trim().is_empty()) {
            self.store_path = PathBuf::from(store);
        }
        if let Some(log) = log.filter(|l| !l.trim().is_empty()) {
            self.log_level = log;
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.refresh_interval_secs == 0 {
            return Err(AppError::InvalidConfig(
                "refresh_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.store_path.as_os_str().is_empty() {
            return Err(AppError::InvalidConfig("store_path must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}
