//! Configuration and settings management
//!
//! Loads settings from environment variables (optionally sourced from `.env`)
//! and an optional `config/harvester` file.

use crate::batch::DEFAULT_REQUEST_DELAY;
use crate::error::HarvestError;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Application settings
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Telegram API id (`API_ID`)
    pub api_id: Option<i32>,
    /// Telegram API hash (`API_HASH`)
    pub api_hash: Option<String>,

    /// Directory holding `*.session` artifacts
    #[serde(default = "default_sessions_dir")]
    pub sessions_dir: PathBuf,
    /// Bot catalog JSON file
    #[serde(default = "default_bot_catalog")]
    pub bot_catalog: PathBuf,
    /// Directory token files are appended in
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Pause between handshakes, in seconds
    #[serde(default = "default_request_delay_secs")]
    pub request_delay_secs: u64,
}

fn default_sessions_dir() -> PathBuf {
    PathBuf::from("sessions")
}

fn default_bot_catalog() -> PathBuf {
    PathBuf::from("bot_information.json")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

const fn default_request_delay_secs() -> u64 {
    DEFAULT_REQUEST_DELAY.as_secs()
}

/// API credentials after validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// API id
    pub api_id: i32,
    /// API hash
    pub api_hash: String,
}

impl Settings {
    /// Load settings from the process environment and config files
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails.
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_env(Environment::default().ignore_empty(true))
    }

    /// Load settings with an explicit bare-variable environment source
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if a value has the wrong type.
    pub fn from_env(env: Environment) -> Result<Self, ConfigError> {
        let s = Config::builder()
            // Optional file, not checked into git
            .add_source(File::with_name("config/harvester").required(false))
            // Eg. `HARVESTER__REQUEST_DELAY_SECS=10`
            .add_source(Environment::with_prefix("HARVESTER").separator("__"))
            // `API_ID`, `API_HASH`, `SESSIONS_DIR`, ... auto-converted to snake_case
            .add_source(env)
            .build()?;

        s.try_deserialize()
    }

    /// Validated API credentials
    ///
    /// # Errors
    ///
    /// Returns `HarvestError::Config` if either value is missing or empty.
    pub fn credentials(&self) -> Result<Credentials, HarvestError> {
        let api_id = self
            .api_id
            .filter(|id| *id > 0)
            .ok_or_else(|| HarvestError::Config("API_ID is missing or invalid".to_string()))?;
        let api_hash = self
            .api_hash
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| HarvestError::Config("API_HASH is missing".to_string()))?;
        Ok(Credentials {
            api_id,
            api_hash: api_hash.to_string(),
        })
    }

    /// Pause between handshakes
    #[must_use]
    pub const fn request_delay(&self) -> Duration {
        Duration::from_secs(self.request_delay_secs)
    }
}
