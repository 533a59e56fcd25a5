//! Admin configuration loaded from environment variables.
//!
//! This is process configuration (where to listen, which database). The
//! operator-editable site settings live in [`crate::models::SiteConfig`].
//!
//! # Environment Variables
//!
//! ## Required
//! - `HUDDLE_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `HUDDLE_BASE_URL` - Public URL of the admin API
//! - `HUDDLE_SESSION_SECRET` - Session cookie signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `HUDDLE_HOST` - Bind address (default: 127.0.0.1)
//! - `HUDDLE_PORT` - Listen port (default: 8065)
//! - `HUDDLE_SITE_CONFIG_PATH` - Site configuration document (default: config.json)
//! - `HUDDLE_LOG_BUFFER_LINES` - Log lines kept for the admin logs endpoint (default: 1000)
//! - `HUDDLE_ANALYTICS_DAYS` - Days returned by day-bucketed analytics (default: 30)
//! - `HUDDLE_TIMEZONE` - IANA zone for calendar days, e.g. `Europe/Berlin` (default: host zone)
//! - `HUDDLE_LOG_JSON` - Emit JSON logs when set to `1` or `true`
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use chrono_tz::Tz;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::analytics::{DEFAULT_DAY_WINDOW, ReferenceZone};
use crate::logs::DEFAULT_CAPACITY;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
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

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the admin API
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Path of the site configuration document
    pub site_config_path: PathBuf,
    /// Capacity of the in-process log ring
    pub log_buffer_lines: usize,
    /// Completed days returned by day-bucketed analytics
    pub analytics_days: u32,
    /// Zone calendar days are computed in
    pub timezone: ReferenceZone,
    /// Emit JSON logs instead of text
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// See [`AdminConfig::from_env`].
    pub fn from_lookup(env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&env);

        let database_url = env
            .get("HUDDLE_DATABASE_URL")
            .or_else(|| env.get("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("HUDDLE_DATABASE_URL".to_string()))?;
        let host = env.parse_or("HUDDLE_HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port = env.parse_or("HUDDLE_PORT", 8065_u16)?;
        let base_url = env.required("HUDDLE_BASE_URL")?;

        let session_secret = env.required("HUDDLE_SESSION_SECRET")?;
        validate_secret_strength(&session_secret, "HUDDLE_SESSION_SECRET")?;
        let session_secret = SecretString::from(session_secret);
        validate_session_secret(&session_secret, "HUDDLE_SESSION_SECRET")?;

        let site_config_path = env
            .get("HUDDLE_SITE_CONFIG_PATH")
            .map_or_else(|| PathBuf::from("config.json"), PathBuf::from);
        let log_buffer_lines = env.parse_or("HUDDLE_LOG_BUFFER_LINES", DEFAULT_CAPACITY)?;
        let analytics_days = env.parse_or("HUDDLE_ANALYTICS_DAYS", DEFAULT_DAY_WINDOW)?;
        let timezone = env
            .get("HUDDLE_TIMEZONE")
            .map_or(Ok(ReferenceZone::Local), |raw| parse_timezone(&raw))?;
        let log_json = env
            .get("HUDDLE_LOG_JSON")
            .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));

        let sentry_dsn = env.get("SENTRY_DSN");
        let sentry_environment = env.get("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = env
            .get("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = env
            .get("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            site_config_path,
            log_buffer_lines,
            analytics_days,
            timezone,
            log_json,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable source with typed accessors.
struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    /// Get an optional variable; empty values count as unset.
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.get(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(key).map_or(Ok(default), |raw| {
            raw.trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }
}

fn parse_timezone(raw: &str) -> Result<ReferenceZone, ConfigError> {
    let name = raw.trim();
    if name.eq_ignore_ascii_case("local") {
        return Ok(ReferenceZone::Local);
    }
    name.parse::<Tz>().map(ReferenceZone::Named).map_err(|_| {
        ConfigError::InvalidEnvVar(
            "HUDDLE_TIMEZONE".to_string(),
            format!("unknown time zone: {name}"),
        )
    })
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const STRONG_SECRET: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%";

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![
            ("HUDDLE_DATABASE_URL", "postgres://localhost/huddle"),
            ("HUDDLE_BASE_URL", "http://localhost:8065"),
            ("HUDDLE_SESSION_SECRET", STRONG_SECRET),
        ]
    }

    #[test]
    fn test_defaults() {
        let config = AdminConfig::from_lookup(lookup(&minimal())).unwrap();

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8065");
        assert_eq!(config.site_config_path, PathBuf::from("config.json"));
        assert_eq!(config.log_buffer_lines, DEFAULT_CAPACITY);
        assert_eq!(config.analytics_days, DEFAULT_DAY_WINDOW);
        assert_eq!(config.timezone, ReferenceZone::Local);
        assert!(!config.log_json);
    }

    #[test]
    fn test_database_url_fallback() {
        let vars = [
            ("DATABASE_URL", "postgres://fallback/huddle"),
            ("HUDDLE_BASE_URL", "http://localhost:8065"),
            ("HUDDLE_SESSION_SECRET", STRONG_SECRET),
        ];
        let config = AdminConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(
            config.database_url.expose_secret(),
            "postgres://fallback/huddle"
        );
    }

    #[test]
    fn test_missing_base_url() {
        let vars: Vec<_> = minimal()
            .into_iter()
            .filter(|(k, _)| *k != "HUDDLE_BASE_URL")
            .collect();
        let err = AdminConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(key) if key == "HUDDLE_BASE_URL"));
    }

    #[test]
    fn test_invalid_port() {
        let mut vars = minimal();
        vars.push(("HUDDLE_PORT", "eighty"));
        let err = AdminConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "HUDDLE_PORT"));
    }

    #[test]
    fn test_timezone_parsing() {
        assert_eq!(
            parse_timezone("America/New_York").unwrap(),
            ReferenceZone::Named(chrono_tz::America::New_York)
        );
        assert_eq!(parse_timezone("local").unwrap(), ReferenceZone::Local);
        assert!(parse_timezone("Mars/Olympus_Mons").is_err());

        let mut vars = minimal();
        vars.push(("HUDDLE_TIMEZONE", "Europe/Berlin"));
        let config = AdminConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(
            config.timezone,
            ReferenceZone::Named(chrono_tz::Europe::Berlin)
        );
    }

    #[test]
    fn test_placeholder_session_secret_rejected() {
        let mut vars = minimal();
        vars.retain(|(k, _)| *k != "HUDDLE_SESSION_SECRET");
        vars.push(("HUDDLE_SESSION_SECRET", "your-session-secret-goes-right-here-ok"));
        let err = AdminConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
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
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_session_secret_too_short() {
        let secret = SecretString::from("short");
        let result = validate_session_secret(&secret, "TEST_SESSION");
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = AdminConfig::from_lookup(lookup(&minimal())).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains(STRONG_SECRET));
        assert!(!debug.contains("postgres://localhost/huddle"));
    }
}
