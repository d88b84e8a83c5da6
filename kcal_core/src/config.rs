//! Configuration file support for kcal.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/kcal/config.toml`.
//! Credentials are never read from the file: the estimator API key comes from
//! the environment (see [`EstimatorConfig::from_env_with`]).

use crate::{Error, Result};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the estimator API key
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";
/// Alternate API key variable, consulted when [`API_KEY_ENV`] is unset
pub const ALT_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const MODEL_ENV: &str = "KCAL_ESTIMATOR_MODEL";
pub const BASE_URL_ENV: &str = "KCAL_ESTIMATOR_URL";
pub const TIMEOUT_ENV: &str = "KCAL_ESTIMATOR_TIMEOUT_SECS";

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub estimator: EstimatorSettings,

    #[serde(default)]
    pub export: ExportConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Non-secret estimator settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EstimatorSettings {
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EstimatorSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Export configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportConfig {
    /// strftime pattern used for dates in CSV exports and tables
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            date_format: default_date_format(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("kcal")
}

fn default_model() -> String {
    "gemini-2.0-flash".into()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".into()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_date_format() -> String {
    "%-m/%-d/%Y".into()
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("kcal").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Path of the history slot inside the data directory
    pub fn history_path(data_dir: &Path) -> PathBuf {
        data_dir.join("workouts.json")
    }
}

/// Everything needed to build the remote estimator, including the API key
#[derive(Clone, Debug)]
pub struct EstimatorConfig {
    pub api_key: SecretString,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl EstimatorConfig {
    /// Build from file settings plus process environment
    pub fn from_env(settings: &EstimatorSettings) -> Result<Self> {
        Self::from_env_with(settings, |k| std::env::var(k).ok())
    }

    /// Testable helper that reads environment values through `get`.
    ///
    /// A missing or blank API key is an [`Error::EstimatorUnavailable`]; the
    /// environment overrides model, base URL and timeout from `settings`.
    pub fn from_env_with<F>(settings: &EstimatorSettings, mut get: F) -> Result<Self>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let api_key = get(API_KEY_ENV)
            .filter(|k| !k.trim().is_empty())
            .or_else(|| get(ALT_API_KEY_ENV).filter(|k| !k.trim().is_empty()))
            .ok_or_else(|| {
                Error::EstimatorUnavailable(format!(
                    "{} is not set in environment variables",
                    API_KEY_ENV
                ))
            })?;

        let model = get(MODEL_ENV).unwrap_or_else(|| settings.model.clone());
        let base_url = get(BASE_URL_ENV).unwrap_or_else(|| settings.base_url.clone());
        let timeout_secs = match get(TIMEOUT_ENV) {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
                Error::Config(format!("{} must be a whole number of seconds: {}", TIMEOUT_ENV, e))
            })?,
            None => settings.timeout_secs,
        };

        Ok(Self {
            api_key: SecretString::from(api_key),
            model,
            base_url,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}
