//! Shop configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `OPENAI_API_KEY` - API key for the completion service
//!
//! ## Optional (model)
//! - `OPENAI_MODEL` - Model ID (default: gpt-4o-mini)
//! - `OPENAI_BASE_URL` - API root (default: <https://api.openai.com/v1>)
//! - `OPENAI_TEMPERATURE` - Sampling temperature, 0.0 to 2.0 (default: 0.7)
//! - `OPENAI_TIMEOUT_SECS` - Per-attempt request timeout (default: 120)
//! - `OPENAI_MAX_RETRIES` - Extra attempts for retryable failures, 0 to 3 (default: 1)
//!
//! ## Optional (server)
//! - `SHOP_HOST` - Bind address (default: 127.0.0.1)
//! - `SHOP_PORT` - Listen port (default: 3000)
//! - `SHOP_LOG_FORMAT` - `text` or `json` (default: text)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`
//!
//! ## Optional (storage)
//! - `SHOP_SCHEMA_PATH` - JSON schema of the state document
//! - `SHOP_LAYOUT_PATH` - Page layout template
//! - `SHOP_SEED_PATH` - Seed fixture copied into the cache on first run
//! - `SHOP_CACHE_DIR` - Directory for `db.json` and cached page fragments (default: cache)
//! - `SHOP_VALIDATE_STATE` - Reject model state that does not match the typed model (default: false)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_MAX_RETRIES: u32 = 1;
const MAX_RETRIES_LIMIT: u32 = 3;

const DEFAULT_SCHEMA_PATH: &str = "crates/shop/data/schema.json";
const DEFAULT_LAYOUT_PATH: &str = "crates/shop/data/templates/page.html";
const DEFAULT_SEED_PATH: &str = "crates/shop/data/templates/db.json";
const DEFAULT_CACHE_DIR: &str = "cache";

/// File name of the persisted state document inside the cache directory.
pub const STATE_FILE_NAME: &str = "db.json";

/// Leading text of sample keys from docs and `.env` templates.
const PLACEHOLDER_PREFIXES: &[&str] = &["your", "<", "changeme", "replace", "insert", "placeholder"];

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

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Shop application configuration.
#[derive(Debug, Clone)]
pub struct ShopConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Completion API configuration
    pub openai: OpenAiConfig,
    /// File locations and state handling
    pub storage: StorageConfig,
    /// Log output format
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Completion API configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct OpenAiConfig {
    /// API key (sent as a bearer token)
    pub api_key: SecretString,
    /// Model ID (e.g., gpt-4o-mini)
    pub model: String,
    /// API root; `/chat/completions` is appended
    pub base_url: Url,
    /// Sampling temperature
    pub temperature: f32,
    /// Timeout for a single attempt
    pub timeout: Duration,
    /// Extra attempts after a retryable failure
    pub max_retries: u32,
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("base_url", &self.base_url.as_str())
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

/// Where the shop reads its inputs and keeps its caches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// JSON schema handed to the model (read-only)
    pub schema_path: PathBuf,
    /// Page layout template handed to the model (read-only)
    pub layout_path: PathBuf,
    /// Seed fixture for the state document (read-only)
    pub seed_path: PathBuf,
    /// Holds `db.json` and one `<page>.html` per cached fragment
    pub cache_dir: PathBuf,
    /// Reject replacement documents that do not parse as `ShopState`
    pub validate_state: bool,
}

impl StorageConfig {
    /// Load storage settings from environment variables.
    ///
    /// Used on its own by the CLI, which does not need API credentials.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `SHOP_VALIDATE_STATE` is not a boolean.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(&env_lookup)
    }

    fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            schema_path: PathBuf::from(get_or_default(lookup, "SHOP_SCHEMA_PATH", DEFAULT_SCHEMA_PATH)),
            layout_path: PathBuf::from(get_or_default(lookup, "SHOP_LAYOUT_PATH", DEFAULT_LAYOUT_PATH)),
            seed_path: PathBuf::from(get_or_default(lookup, "SHOP_SEED_PATH", DEFAULT_SEED_PATH)),
            cache_dir: PathBuf::from(get_or_default(lookup, "SHOP_CACHE_DIR", DEFAULT_CACHE_DIR)),
            validate_state: parse_bool(
                "SHOP_VALIDATE_STATE",
                &get_or_default(lookup, "SHOP_VALIDATE_STATE", "false"),
            )?,
        })
    }

    /// Path of the persisted state document.
    #[must_use]
    pub fn state_path(&self) -> PathBuf {
        self.cache_dir.join(STATE_FILE_NAME)
    }
}

impl ShopConfig {
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
        Self::from_lookup(&env_lookup)
    }

    fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = get_or_default(lookup, "SHOP_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("SHOP_HOST".to_string(), e.to_string()))?;
        let port = get_or_default(lookup, "SHOP_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SHOP_PORT".to_string(), e.to_string()))?;
        let log_format = match get_or_default(lookup, "SHOP_LOG_FORMAT", "text")
            .to_ascii_lowercase()
            .as_str()
        {
            "text" => LogFormat::Text,
            "json" => LogFormat::Json,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "SHOP_LOG_FORMAT".to_string(),
                    format!("expected 'text' or 'json', got '{other}'"),
                ));
            }
        };

        Ok(Self {
            host,
            port,
            openai: OpenAiConfig::from_lookup(lookup)?,
            storage: StorageConfig::from_lookup(lookup)?,
            log_format,
            sentry_dsn: lookup("SENTRY_DSN"),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: lookup("SENTRY_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.0),
            sentry_traces_sample_rate: lookup("SENTRY_TRACES_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.0),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl OpenAiConfig {
    fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup("OPENAI_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string()))?;
        if let Err(e) = check_api_key(&api_key) {
            tracing::warn!("OPENAI_API_KEY validation warning: {e}");
        }

        let base_url = Url::parse(&get_or_default(lookup, "OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL))
            .map_err(|e| ConfigError::InvalidEnvVar("OPENAI_BASE_URL".to_string(), e.to_string()))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "OPENAI_BASE_URL".to_string(),
                format!("unsupported scheme '{}'", base_url.scheme()),
            ));
        }

        let temperature = match lookup("OPENAI_TEMPERATURE") {
            Some(raw) => raw.parse::<f32>().map_err(|e| {
                ConfigError::InvalidEnvVar("OPENAI_TEMPERATURE".to_string(), e.to_string())
            })?,
            None => DEFAULT_TEMPERATURE,
        };
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::InvalidEnvVar(
                "OPENAI_TEMPERATURE".to_string(),
                format!("must be between 0.0 and 2.0 (got {temperature})"),
            ));
        }

        let timeout_secs = get_or_default(lookup, "OPENAI_TIMEOUT_SECS", &DEFAULT_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar("OPENAI_TIMEOUT_SECS".to_string(), e.to_string()))?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "OPENAI_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let max_retries = get_or_default(lookup, "OPENAI_MAX_RETRIES", &DEFAULT_MAX_RETRIES.to_string())
            .parse::<u32>()
            .map_err(|e| ConfigError::InvalidEnvVar("OPENAI_MAX_RETRIES".to_string(), e.to_string()))?;
        if max_retries > MAX_RETRIES_LIMIT {
            return Err(ConfigError::InvalidEnvVar(
                "OPENAI_MAX_RETRIES".to_string(),
                format!("must be at most {MAX_RETRIES_LIMIT} (got {max_retries})"),
            ));
        }

        Ok(Self {
            api_key: SecretString::from(api_key),
            model: get_or_default(lookup, "OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
            base_url,
            temperature,
            timeout: Duration::from_secs(timeout_secs),
            max_retries,
        })
    }

    /// Full URL of the chat completions endpoint.
    #[must_use]
    pub fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.base_url.as_str().trim_end_matches('/')
        )
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get a variable with a default value.
fn get_or_default(lookup: &dyn Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    lookup(key).unwrap_or_else(|| default.to_string())
}

/// Parse a boolean flag (`true`/`false`/`1`/`0`/`yes`/`no`).
fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got '{other}'"),
        )),
    }
}

/// Shannon entropy in bits per byte.
fn shannon_entropy(s: &str) -> f64 {
    let mut counts: HashMap<u8, u32> = HashMap::new();
    for b in s.bytes() {
        *counts.entry(b).or_default() += 1;
    }

    let total: u32 = counts.values().sum();
    counts
        .values()
        .map(|&n| {
            let p = f64::from(n) / f64::from(total);
            -p * p.log2()
        })
        .sum()
}

/// Reject keys that look copied from a template rather than issued by OpenAI.
///
/// Only the part after the `sk-` / `sk-proj-` prefix is inspected.
fn check_api_key(key: &str) -> Result<(), ConfigError> {
    let insecure = |reason: String| ConfigError::InsecureSecret("OPENAI_API_KEY".to_string(), reason);

    let lower = key.trim().to_ascii_lowercase();
    let body = lower
        .strip_prefix("sk-proj-")
        .or_else(|| lower.strip_prefix("sk-"))
        .unwrap_or(&lower);

    if let Some(prefix) = PLACEHOLDER_PREFIXES.iter().find(|p| body.starts_with(*p)) {
        return Err(insecure(format!("appears to be a placeholder (starts with '{prefix}')")));
    }
    if body.chars().all(|c| matches!(c, 'x' | '.' | '*' | '-' | '_')) {
        return Err(insecure("appears to be a placeholder (masked)".to_string()));
    }

    let entropy = shannon_entropy(body);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(insecure(format!(
            "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
        )));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    const API_KEY: &str = "sk-proj-aB3xY9mK2nL5pQ7rT0uW4zC6";

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ShopConfig::from_lookup(&lookup_from(&[("OPENAI_API_KEY", API_KEY)])).unwrap();

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.openai.model, DEFAULT_OPENAI_MODEL);
        assert!((config.openai.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.openai.timeout, Duration::from_secs(120));
        assert_eq!(config.openai.max_retries, 1);
        assert_eq!(
            config.openai.completions_url(),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(config.storage.cache_dir, PathBuf::from("cache"));
        assert_eq!(config.storage.state_path(), PathBuf::from("cache/db.json"));
        assert!(!config.storage.validate_state);
        assert_eq!(config.openai.api_key.expose_secret(), API_KEY);
    }

    #[test]
    fn test_missing_api_key() {
        let err = ShopConfig::from_lookup(&lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref key) if key == "OPENAI_API_KEY"));
    }

    #[test]
    fn test_overrides() {
        let config = ShopConfig::from_lookup(&lookup_from(&[
            ("OPENAI_API_KEY", API_KEY),
            ("OPENAI_BASE_URL", "http://localhost:8080/v1/"),
            ("OPENAI_MAX_RETRIES", "0"),
            ("SHOP_PORT", "4567"),
            ("SHOP_LOG_FORMAT", "JSON"),
            ("SHOP_CACHE_DIR", "/tmp/shop-cache"),
            ("SHOP_VALIDATE_STATE", "yes"),
        ]))
        .unwrap();

        assert_eq!(config.port, 4567);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.openai.max_retries, 0);
        assert_eq!(
            config.openai.completions_url(),
            "http://localhost:8080/v1/chat/completions"
        );
        assert_eq!(
            config.storage.state_path(),
            PathBuf::from("/tmp/shop-cache/db.json")
        );
        assert!(config.storage.validate_state);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        for (key, value) in [
            ("OPENAI_TEMPERATURE", "3.5"),
            ("OPENAI_TIMEOUT_SECS", "0"),
            ("OPENAI_MAX_RETRIES", "10"),
            ("OPENAI_BASE_URL", "ftp://models.local"),
            ("SHOP_LOG_FORMAT", "xml"),
            ("SHOP_VALIDATE_STATE", "maybe"),
            ("SHOP_PORT", "70000"),
        ] {
            let result =
                ShopConfig::from_lookup(&lookup_from(&[("OPENAI_API_KEY", API_KEY), (key, value)]));
            assert!(
                matches!(result, Err(ConfigError::InvalidEnvVar(ref k, _)) if k == key),
                "{key}={value} should be rejected"
            );
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        // "ab" has entropy of 1 bit per char (50% a, 50% b)
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_placeholder_keys_are_flagged() {
        for key in ["your-api-key-here", "sk-your-key", "sk-proj-<paste here>", "sk-...", "sk-xxxxxxxx", "changeme"] {
            assert!(
                matches!(check_api_key(key), Err(ConfigError::InsecureSecret(_, _))),
                "{key} should be flagged"
            );
        }
    }

    #[test]
    fn test_real_looking_keys_pass() {
        assert!(check_api_key(API_KEY).is_ok());
        assert!(check_api_key("sk-proj-Tq8xxxVn2Lr5example9Kd7Wz3").is_ok());
    }

    #[test]
    fn test_openai_config_debug_redacts_secrets() {
        let config = ShopConfig::from_lookup(&lookup_from(&[("OPENAI_API_KEY", API_KEY)]))
            .unwrap()
            .openai;

        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("gpt-4o-mini"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains(API_KEY));
    }
}
