//! Error types for the kcal_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for kcal_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed or missing estimation input; rejected before any remote call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Estimator could not be configured (e.g. missing credentials)
    #[error("Estimator unavailable: {0}")]
    EstimatorUnavailable(String),

    /// Estimator answered with something that is not a calorie count
    #[error("Unparseable estimator response: {0}")]
    EstimationParse(String),

    /// Transport, timeout or service error from the estimator
    #[error("Estimator call failed: {0}")]
    Remote(String),

    /// Persisted history could not be read or parsed
    #[error("Storage read error: {0}")]
    StorageRead(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error is allowed to cross the estimation boundary.
    ///
    /// Parse, remote and storage-read failures are always absorbed by a
    /// fallback path and never reach the user.
    pub fn is_surfaced(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::EstimatorUnavailable(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Remote(format!("request timed out: {}", e))
        } else {
            Error::Remote(e.to_string())
        }
    }
}
