//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ARTPRINT_API_BASE_URL` - Backend REST API base (e.g., `https://shop.example/api/`)
//!
//! ## Optional
//! - `ARTPRINT_API_TOKEN` - Bearer token of a signed-in buyer
//! - `ARTPRINT_USER_ID` - ID of the signed-in buyer (required with the token)
//! - `ARTPRINT_REQUEST_TIMEOUT_SECS` - HTTP request timeout (default: 30)
//! - `ARTPRINT_NAVIGATION_DELAY_MS` - Pause before navigating to order tracking (default: 1500)
//! - `ARTPRINT_PRODUCT_CACHE_TTL_SECS` - Product snapshot cache TTL (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use artprint_core::UserId;

use crate::models::{CurrentUser, Session};

const DEFAULT_REQUEST_TIMEOUT_SECS: &str = "30";
const DEFAULT_NAVIGATION_DELAY_MS: &str = "1500";
const DEFAULT_PRODUCT_CACHE_TTL_SECS: &str = "300";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront engine configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Backend API configuration
    pub api: ApiConfig,
    /// Signed-in buyer, if any
    pub session: Option<Session>,
    /// Pause between a successful order and navigating to its tracking view
    pub navigation_delay: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Backend REST API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL every endpoint path is resolved against
    pub base_url: Url,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// How long product snapshots stay cached
    pub product_cache_ttl: Duration,
}

impl ApiConfig {
    /// Build an API configuration with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `base_url` does not parse.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url("ARTPRINT_API_BASE_URL", base_url)?,
            request_timeout: Duration::from_secs(30),
            product_cache_ttl: Duration::from_secs(300),
        })
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if the API token looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let base_url = parse_base_url(
            "ARTPRINT_API_BASE_URL",
            &get_required_env("ARTPRINT_API_BASE_URL")?,
        )?;
        let request_timeout = Duration::from_secs(get_parsed_env(
            "ARTPRINT_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?);
        let product_cache_ttl = Duration::from_secs(get_parsed_env(
            "ARTPRINT_PRODUCT_CACHE_TTL_SECS",
            DEFAULT_PRODUCT_CACHE_TTL_SECS,
        )?);
        let navigation_delay = Duration::from_millis(get_parsed_env(
            "ARTPRINT_NAVIGATION_DELAY_MS",
            DEFAULT_NAVIGATION_DELAY_MS,
        )?);

        let session = session_from_env()?;

        Ok(Self {
            api: ApiConfig {
                base_url,
                request_timeout,
                product_cache_ttl,
            },
            session,
            navigation_delay,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }
}

/// Build the buyer session from `ARTPRINT_API_TOKEN` / `ARTPRINT_USER_ID`.
///
/// Both must be present for a session; neither means guest mode.
fn session_from_env() -> Result<Option<Session>, ConfigError> {
    match (
        get_optional_env("ARTPRINT_API_TOKEN"),
        get_optional_env("ARTPRINT_USER_ID"),
    ) {
        (None, None) => Ok(None),
        (Some(_), None) => Err(ConfigError::MissingEnvVar("ARTPRINT_USER_ID".to_string())),
        (None, Some(_)) => Err(ConfigError::MissingEnvVar(
            "ARTPRINT_API_TOKEN".to_string(),
        )),
        (Some(token), Some(user_id)) => {
            let token = SecretString::from(token);
            validate_token(&token, "ARTPRINT_API_TOKEN")?;
            Ok(Some(Session::new(
                CurrentUser {
                    id: UserId::new(user_id),
                    name: None,
                },
                token,
            )))
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get and parse a numeric environment variable.
fn get_parsed_env(key: &str, default: &str) -> Result<u64, ConfigError> {
    get_env_or_default(key, default)
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse the API base URL so that relative endpoint paths resolve beneath it.
///
/// `Url::join` replaces the last path segment unless the base ends in `/`,
/// so a trailing slash is added when missing.
fn parse_base_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let normalized = if value.ends_with('/') {
        value.to_string()
    } else {
        format!("{value}/")
    };

    let url = Url::parse(&normalized)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be an http(s) URL".to_string(),
        ));
    }

    Ok(url)
}

/// Reject tokens that are obviously placeholders copied from a template.
fn validate_token(token: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let lower = token.expose_secret().to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    Ok(())
}
