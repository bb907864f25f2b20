//! Application configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_JWT_SECRET: &str = "insecure-dev-secret";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Razorpay API credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RazorpayCredentials {
    pub key_id: String,
    pub key_secret: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} has an invalid value: {value:?}")]
    Invalid { name: &'static str, value: String },

    #[error("RAZORPAY_KEY_ID and RAZORPAY_KEY_SECRET must be set together")]
    PartialRazorpayCredentials,
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `text` or `json` (default: `text`)
/// - `DATABASE_URL`: Postgres URL; unset runs on the in-memory store
/// - `JWT_SECRET`: HS256 signing secret
/// - `ACCESS_TOKEN_TTL_SECS` / `REFRESH_TOKEN_TTL_SECS`: token lifetimes (default: 300 / 86400)
/// - `RAZORPAY_KEY_ID` / `RAZORPAY_KEY_SECRET`: unset runs on the in-memory gateway
/// - `RAZORPAY_API_BASE`: gateway base URL (default: `https://api.razorpay.com`)
/// - `GATEWAY_TIMEOUT_SECS`: gateway request timeout (default: 30)
/// - `STORE_DISPLAY_NAME`: merchant name shown at checkout (default: `"T-Shirt Store"`)
/// - `LOW_STOCK_THRESHOLD`: stock level that raises an alert (default: 10)
/// - `MEDIA_ROOT`: directory for uploaded images (default: `"media"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub razorpay: Option<RazorpayCredentials>,
    pub razorpay_api_base: String,
    pub gateway_timeout: Duration,
    pub store_display_name: String,
    pub low_stock_threshold: i64,
    pub media_root: PathBuf,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through `lookup`, which returns the raw value of a
    /// variable if it is set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let log_format = match get("LOG_FORMAT").as_deref() {
            None => defaults.log_format,
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            Some(v) if v.eq_ignore_ascii_case("text") => LogFormat::Text,
            Some(v) => {
                return Err(ConfigError::Invalid {
                    name: "LOG_FORMAT",
                    value: v.to_string(),
                });
            }
        };

        let razorpay = match (get("RAZORPAY_KEY_ID"), get("RAZORPAY_KEY_SECRET")) {
            (Some(key_id), Some(key_secret)) => Some(RazorpayCredentials { key_id, key_secret }),
            (None, None) => None,
            _ => return Err(ConfigError::PartialRazorpayCredentials),
        };

        Ok(Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: parse(&get, "PORT")?.unwrap_or(defaults.port),
            log_level: get("RUST_LOG").unwrap_or(defaults.log_level),
            log_format,
            database_url: get("DATABASE_URL"),
            jwt_secret: get("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            access_token_ttl: parse(&get, "ACCESS_TOKEN_TTL_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.access_token_ttl),
            refresh_token_ttl: parse(&get, "REFRESH_TOKEN_TTL_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.refresh_token_ttl),
            razorpay,
            razorpay_api_base: get("RAZORPAY_API_BASE").unwrap_or(defaults.razorpay_api_base),
            gateway_timeout: parse(&get, "GATEWAY_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.gateway_timeout),
            store_display_name: get("STORE_DISPLAY_NAME").unwrap_or(defaults.store_display_name),
            low_stock_threshold: parse(&get, "LOW_STOCK_THRESHOLD")?
                .unwrap_or(defaults.low_stock_threshold),
            media_root: get("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.media_root),
        })
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// True when tokens are signed with the built-in development secret.
    pub fn uses_default_jwt_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

fn parse<T: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    match get(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            database_url: None,
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            access_token_ttl: Duration::from_secs(5 * 60),
            refresh_token_ttl: Duration::from_secs(24 * 60 * 60),
            razorpay: None,
            razorpay_api_base: payments::razorpay::DEFAULT_API_BASE.to_string(),
            gateway_timeout: Duration::from_secs(30),
            store_display_name: "T-Shirt Store".to_string(),
            low_stock_threshold: analytics::DEFAULT_LOW_STOCK_THRESHOLD,
            media_root: PathBuf::from("media"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = load(&[]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.database_url.is_none());
        assert!(config.razorpay.is_none());
        assert!(config.uses_default_jwt_secret());
        assert_eq!(config.access_token_ttl, Duration::from_secs(300));
        assert_eq!(config.refresh_token_ttl, Duration::from_secs(86_400));
        assert_eq!(config.store_display_name, "T-Shirt Store");
        assert_eq!(config.low_stock_threshold, 10);
        assert_eq!(config.media_root, PathBuf::from("media"));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("PORT", "8080"),
            ("LOG_FORMAT", "JSON"),
            ("DATABASE_URL", "postgres://localhost/shop"),
            ("JWT_SECRET", "s3cret"),
            ("ACCESS_TOKEN_TTL_SECS", "60"),
            ("RAZORPAY_KEY_ID", "rzp_test_abc"),
            ("RAZORPAY_KEY_SECRET", "xyz"),
            ("LOW_STOCK_THRESHOLD", "3"),
            ("MEDIA_ROOT", "/var/lib/storefront/media"),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/shop"));
        assert!(!config.uses_default_jwt_secret());
        assert_eq!(config.access_token_ttl, Duration::from_secs(60));
        assert_eq!(
            config.razorpay,
            Some(RazorpayCredentials {
                key_id: "rzp_test_abc".to_string(),
                key_secret: "xyz".to_string(),
            })
        );
        assert_eq!(config.low_stock_threshold, 3);
        assert_eq!(config.media_root, PathBuf::from("/var/lib/storefront/media"));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert_eq!(
            load(&[("PORT", "eighty")]).unwrap_err(),
            ConfigError::Invalid {
                name: "PORT",
                value: "eighty".to_string()
            }
        );
        assert!(load(&[("LOG_FORMAT", "xml")]).is_err());
        assert_eq!(
            load(&[("RAZORPAY_KEY_ID", "rzp_test_abc")]).unwrap_err(),
            ConfigError::PartialRazorpayCredentials
        );
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }
}
