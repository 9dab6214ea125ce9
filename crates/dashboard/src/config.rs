//! Dashboard configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `SLOOZE_API_URL` - Base URL of the ordering backend (default: `http://localhost:4000`)
//! - `SLOOZE_REQUEST_TIMEOUT_SECS` - Per-request timeout in seconds (default: 30)
//! - `SLOOZE_SESSION_FILE` - Keep the session in this file across restarts.
//!   When unset the session lives only as long as the process.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::store::SessionPersistence;

const DEFAULT_API_URL: &str = "http://localhost:4000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Dashboard configuration.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Base URL of the ordering backend
    pub api_url: Url,
    /// Timeout applied to every backend request
    pub request_timeout: Duration,
    /// Where the session identity is kept
    pub session: SessionPersistence,
}

impl DashboardConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but empty or unparseable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = parse_api_url(
            &non_empty(&lookup, "SLOOZE_API_URL")?.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        )?;

        let request_timeout = match non_empty(&lookup, "SLOOZE_REQUEST_TIMEOUT_SECS")? {
            Some(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|e| {
                    ConfigError::InvalidEnvVar(
                        "SLOOZE_REQUEST_TIMEOUT_SECS".to_string(),
                        e.to_string(),
                    )
                })?;
                if secs == 0 {
                    return Err(ConfigError::InvalidEnvVar(
                        "SLOOZE_REQUEST_TIMEOUT_SECS".to_string(),
                        "must be greater than zero".to_string(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let session = lookup("SLOOZE_SESSION_FILE")
            .filter(|path| !path.trim().is_empty())
            .map_or(SessionPersistence::Memory, |path| {
                SessionPersistence::File(PathBuf::from(path))
            });

        Ok(Self {
            api_url,
            request_timeout,
            session,
        })
    }
}

/// Parse a backend base URL, accepting only http(s).
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` if the URL is malformed or not http(s).
pub fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar("SLOOZE_API_URL".to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "SLOOZE_API_URL".to_string(),
            format!("unsupported scheme {}", url.scheme()),
        ));
    }

    Ok(url)
}

/// A variable that, when present, must not be blank.
fn non_empty(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<String>, ConfigError> {
    match lookup(key) {
        Some(value) if value.trim().is_empty() => Err(ConfigError::MissingEnvVar(key.to_string())),
        value => Ok(value),
    }
}
