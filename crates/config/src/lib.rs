//! Configuration loading, validation, and management for CampusDesk.
//!
//! Loads configuration from `~/.campusdesk/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.campusdesk/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the intents catalog (patterns + canned responses)
    #[serde(default = "default_intents_path")]
    pub intents_path: String,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Student record store configuration
    #[serde(default)]
    pub records: RecordsConfig,

    /// Intent classifier configuration
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Dialog behaviour
    #[serde(default)]
    pub dialog: DialogConfig,
}

fn default_intents_path() -> String {
    "intents.json".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Sessions untouched for this long are eligible for eviction
    #[serde(default = "default_session_idle_minutes")]
    pub session_idle_minutes: u32,

    /// Soft cap on live sessions before idle ones are swept
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
}

fn default_port() -> u16 {
    5000
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_session_idle_minutes() -> u32 {
    60
}
fn default_max_sessions() -> usize {
    10_000
}
fn default_cookie_name() -> String {
    "campusdesk_session".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            session_idle_minutes: default_session_idle_minutes(),
            max_sessions: default_max_sessions(),
            cookie_name: default_cookie_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordsConfig {
    /// "sqlite" or "memory"
    #[serde(default = "default_records_backend")]
    pub backend: String,

    #[serde(default = "default_database_path")]
    pub database_path: String,
}

fn default_records_backend() -> String {
    "sqlite".into()
}
fn default_database_path() -> String {
    "university.db".into()
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            backend: default_records_backend(),
            database_path: default_database_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// "keyword" (local, catalog patterns) or "remote" (model endpoint)
    #[serde(default = "default_classifier_backend")]
    pub backend: String,

    /// Model-serving URL for the remote backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Expected model artifact version; checked against the endpoint's reply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_classifier_backend() -> String {
    "keyword".into()
}
fn default_timeout_secs() -> u64 {
    10
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            backend: default_classifier_backend(),
            endpoint: None,
            model_version: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogConfig {
    /// Classifications at or below this confidence get the rephrase prompt
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,

    /// Failed logins allowed before the pending request is dropped.
    /// Unset = unlimited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_login_attempts: Option<u32>,

    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

fn default_confidence_threshold() -> f32 {
    0.60
}
fn default_currency_symbol() -> String {
    "₦".into()
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            max_login_attempts: None,
            currency_symbol: default_currency_symbol(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.campusdesk/config.toml).
    ///
    /// Environment variables override the file:
    /// - `CAMPUSDESK_DATABASE` — record store path
    /// - `CAMPUSDESK_INTENTS` — intents catalog path
    /// - `CAMPUSDESK_PORT` — gateway port
    /// - `CAMPUSDESK_CLASSIFIER_URL` — remote classifier endpoint (selects the remote backend)
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(path) = var("CAMPUSDESK_DATABASE") {
            self.records.database_path = path;
        }
        if let Some(path) = var("CAMPUSDESK_INTENTS") {
            self.intents_path = path;
        }
        if let Some(port) = var("CAMPUSDESK_PORT") {
            self.gateway.port = port.parse().map_err(|_| {
                ConfigError::ValidationError(format!("CAMPUSDESK_PORT is not a port: {port}"))
            })?;
        }
        if let Some(url) = var("CAMPUSDESK_CLASSIFIER_URL") {
            self.classifier.backend = "remote".into();
            self.classifier.endpoint = Some(url);
        }
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".campusdesk")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.dialog.confidence_threshold) {
            return Err(ConfigError::ValidationError(
                "dialog.confidence_threshold must be between 0.0 and 1.0".into(),
            ));
        }

        if self.dialog.max_login_attempts == Some(0) {
            return Err(ConfigError::ValidationError(
                "dialog.max_login_attempts must be at least 1 (omit it for unlimited)".into(),
            ));
        }

        if self.gateway.port == 0 {
            return Err(ConfigError::ValidationError("gateway.port must be > 0".into()));
        }

        match self.records.backend.as_str() {
            "sqlite" if self.records.database_path.trim().is_empty() => {
                return Err(ConfigError::ValidationError(
                    "records.database_path must not be empty".into(),
                ));
            }
            "sqlite" | "memory" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "unknown records.backend: {other}"
                )));
            }
        }

        match self.classifier.backend.as_str() {
            "keyword" => {}
            "remote" if self.classifier.endpoint.is_none() => {
                return Err(ConfigError::ValidationError(
                    "classifier.endpoint is required for the remote backend".into(),
                ));
            }
            "remote" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "unknown classifier.backend: {other}"
                )));
            }
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            intents_path: default_intents_path(),
            gateway: GatewayConfig::default(),
            records: RecordsConfig::default(),
            classifier: ClassifierConfig::default(),
            dialog: DialogConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
