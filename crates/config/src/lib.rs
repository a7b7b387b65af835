//! Configuration loading, validation, and management for the NCERT tutor.
//!
//! Loads configuration from `~/.ncert-tutor/config.toml` with environment
//! variable overrides. Validates all settings at startup.
//!
//! The only setting without a usable default is the backend credential.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variables checked for the API key, highest priority first.
pub const API_KEY_ENV_VARS: [&str; 3] = ["NCERT_TUTOR_API_KEY", "GEMINI_API_KEY", "API_KEY"];

/// The root configuration structure.
///
/// Maps directly to `~/.ncert-tutor/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Backend API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Backend base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model names per response tier
    #[serde(default)]
    pub models: ModelsConfig,

    /// Sampling temperature used for every profile
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Extended-reasoning budget for the thinking profile (tokens)
    #[serde(default = "default_thinking_budget")]
    pub thinking_budget: u32,

    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_thinking_budget() -> u32 {
    32768
}
fn default_request_timeout() -> u64 {
    300
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("models", &self.models)
            .field("temperature", &self.temperature)
            .field("thinking_budget", &self.thinking_budget)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

/// Backend model names for each response tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Default mid-tier model
    #[serde(default = "default_standard_model")]
    pub standard: String,

    /// Low-latency model
    #[serde(default = "default_fast_model")]
    pub fast: String,

    /// High-capability, vision-capable model (thinking and image turns)
    #[serde(default = "default_pro_model")]
    pub pro: String,
}

fn default_standard_model() -> String {
    "gemini-3-flash-preview".into()
}
fn default_fast_model() -> String {
    "gemini-2.5-flash-lite".into()
}
fn default_pro_model() -> String {
    "gemini-3-pro-preview".into()
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            standard: default_standard_model(),
            fast: default_fast_model(),
            pro: default_pro_model(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.ncert-tutor/config.toml).
    ///
    /// Also checks environment variables:
    /// - `NCERT_TUTOR_API_KEY`, `GEMINI_API_KEY`, `API_KEY` (first one set wins,
    ///   only when the file has no key)
    /// - `NCERT_TUTOR_MODEL_STANDARD`, `NCERT_TUTOR_MODEL_FAST`, `NCERT_TUTOR_MODEL_PRO`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
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

    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if self.api_key.is_none() {
            self.api_key = API_KEY_ENV_VARS.iter().find_map(|key| lookup(*key));
        }

        if let Some(model) = lookup("NCERT_TUTOR_MODEL_STANDARD") {
            self.models.standard = model;
        }
        if let Some(model) = lookup("NCERT_TUTOR_MODEL_FAST") {
            self.models.fast = model;
        }
        if let Some(model) = lookup("NCERT_TUTOR_MODEL_PRO") {
            self.models.pro = model;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".ncert-tutor")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.thinking_budget == 0 {
            return Err(ConfigError::ValidationError(
                "thinking_budget must be > 0".into(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "request_timeout_secs must be > 0".into(),
            ));
        }

        let models = [&self.models.standard, &self.models.fast, &self.models.pro];
        if models.iter().any(|m| m.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "model names must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
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
            api_key: None,
            base_url: default_base_url(),
            models: ModelsConfig::default(),
            temperature: default_temperature(),
            thinking_budget: default_thinking_budget(),
            request_timeout_secs: default_request_timeout(),
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
