//! Application configuration loaded from environment variables.

use std::time::Duration;

use domain::Policy;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `json` for JSON lines, anything else for human-readable
/// - `DATABASE_URL`: PostgreSQL connection string; in-memory storage if unset
/// - `AUDIT_USER`: name stamped into audit fields (default: `"system"`)
/// - `HANDLER_RETRIES`: retries of transient handler failures (default: `0`)
/// - `HANDLER_RETRY_DELAY_MS`: delay between retries (default: `100`)
/// - `HANDLER_TIMEOUT_MS`: per-handler time budget; unbounded if unset
///
/// Unparseable numbers fall back to their defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub audit_user: String,
    pub handler_retries: u32,
    pub handler_retry_delay: Duration,
    pub handler_timeout: Option<Duration>,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            host: non_empty("HOST").unwrap_or(defaults.host),
            port: non_empty("PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(defaults.port),
            log_level: non_empty("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: match non_empty("LOG_FORMAT") {
                Some(format) if format.trim().eq_ignore_ascii_case("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },
            database_url: non_empty("DATABASE_URL"),
            audit_user: non_empty("AUDIT_USER").unwrap_or(defaults.audit_user),
            handler_retries: non_empty("HANDLER_RETRIES")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.handler_retries),
            handler_retry_delay: non_empty("HANDLER_RETRY_DELAY_MS")
                .and_then(|v| v.trim().parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.handler_retry_delay),
            handler_timeout: non_empty("HANDLER_TIMEOUT_MS")
                .and_then(|v| v.trim().parse().ok())
                .map(Duration::from_millis),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Builds the retry/timeout policy the handlers run under.
    pub fn policy(&self) -> Policy {
        let policy =
            Policy::default().with_retries(self.handler_retries, self.handler_retry_delay);
        match self.handler_timeout {
            Some(timeout) => policy.with_timeout(timeout),
            None => policy,
        }
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
            audit_user: "system".to_string(),
            handler_retries: 0,
            handler_retry_delay: Duration::from_millis(100),
            handler_timeout: None,
        }
    }
}
