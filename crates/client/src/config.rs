//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `VITRINE_API_URL` - Versioned base URL of the commerce API
//!   (e.g. `https://api.example.com/api/v1`)
//!
//! ## Optional
//! - `VITRINE_STATE_DIR` - Where the cart, token and profile are stored
//!   (default: `<data dir>/vitrine`)
//! - `VITRINE_CURRENCY` - Currency prices are quoted in (default: XAF)
//! - `VITRINE_PAGE_SIZE` - Products per page, 1-100 (default: 20)
//! - `VITRINE_CACHE_TTL_SECS` - Catalogue metadata cache lifetime (default: 300)
//! - `VITRINE_HTTP_TIMEOUT_SECS` - Request timeout (default: HTTP client default)
//! - `VITRINE_LOG_FORMAT` - `text` or `json` (default: text)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;
use vitrine_core::CurrencyCode;

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;
const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Versioned base URL of the commerce API
    pub api_url: Url,
    /// Directory holding persisted client state
    pub state_dir: PathBuf,
    /// Currency catalogue prices are quoted in
    pub currency: CurrencyCode,
    /// Products requested per page
    pub page_size: u32,
    /// How long catalogue metadata stays cached
    pub cache_ttl: Duration,
    /// Request timeout; `None` keeps the HTTP client default
    pub http_timeout: Option<Duration>,
    /// Log output format
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let api_url = env.required("VITRINE_API_URL")?;
        let api_url = Url::parse(&api_url)
            .map_err(|e| ConfigError::InvalidEnvVar("VITRINE_API_URL".to_string(), e.to_string()))?;
        if !matches!(api_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "VITRINE_API_URL".to_string(),
                format!("unsupported scheme {}", api_url.scheme()),
            ));
        }

        let state_dir = env
            .optional("VITRINE_STATE_DIR")
            .map_or_else(default_state_dir, PathBuf::from);

        let currency = env
            .or_default("VITRINE_CURRENCY", "XAF")
            .parse::<CurrencyCode>()
            .map_err(|e| ConfigError::InvalidEnvVar("VITRINE_CURRENCY".to_string(), e))?;

        let page_size = env.parsed("VITRINE_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(ConfigError::InvalidEnvVar(
                "VITRINE_PAGE_SIZE".to_string(),
                format!("must be between 1 and {MAX_PAGE_SIZE}"),
            ));
        }

        let cache_ttl = Duration::from_secs(env.parsed("VITRINE_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)?);

        let http_timeout = env
            .optional("VITRINE_HTTP_TIMEOUT_SECS")
            .map(|raw| {
                raw.parse::<u64>().map(Duration::from_secs).map_err(|e| {
                    ConfigError::InvalidEnvVar("VITRINE_HTTP_TIMEOUT_SECS".to_string(), e.to_string())
                })
            })
            .transpose()?;

        let log_format = match env.or_default("VITRINE_LOG_FORMAT", "text").as_str() {
            "text" => LogFormat::Text,
            "json" => LogFormat::Json,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "VITRINE_LOG_FORMAT".to_string(),
                    format!("expected text or json, got {other}"),
                ));
            }
        };

        Ok(Self {
            api_url,
            state_dir,
            currency,
            page_size,
            cache_ttl,
            http_timeout,
            log_format,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }
}

/// Default state directory under the platform data dir.
fn default_state_dir() -> PathBuf {
    dirs::data_dir().map_or_else(|| PathBuf::from(".vitrine"), |dir| dir.join("vitrine"))
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get an optional variable, treating empty values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable, falling back to a default when unset.
    fn parsed<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |raw| {
            raw.trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }
}
