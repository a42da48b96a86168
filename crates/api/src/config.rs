//! Application configuration loaded from environment variables.

use std::time::Duration;

use communicator::RetryPolicy;

const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(200);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(5);

/// Coordinator configuration, resolved once at startup and passed by
/// reference from then on — no module-level singletons.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `COORDINATOR_LOG_LEVEL` — tracing filter directive (default: `"info"`);
///   `RUST_LOG` takes precedence if set (applied in `main`).
/// - `COORDINATOR_REQUEST_TIMEOUT_MS` — per-call timeout handed to the
///   communicator (default: `5000`).
/// - `COORDINATOR_MAX_RETRIES` — communicator retry attempts, including the
///   first (default: `3`).
///
/// Participant addresses (`ORDER_SERVICE_URL`, `INVENTORY_SERVICE_URL`, ...)
/// are read directly by `communicator::discover_all` and are not duplicated
/// here.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub request_timeout: Duration,
    pub max_retries: u32,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            log_level: std::env::var("COORDINATOR_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            request_timeout: std::env::var("COORDINATOR_REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(Duration::from_millis(5000)),
            max_retries: std::env::var("COORDINATOR_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Builds the communicator's retry policy from `max_retries`, with a
    /// fixed base/max backoff delay (not independently configurable — the
    /// spec only names a retry count and a request timeout).
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            request_timeout: Duration::from_millis(5000),
            max_retries: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            log_level: "debug".to_string(),
            request_timeout: Duration::from_millis(1000),
            max_retries: 2,
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_addr_default() {
        let config = Config::default();
        assert_eq!(config.addr(), "0.0.0.0:3000");
    }

    #[test]
    fn retry_policy_uses_configured_max_attempts() {
        let config = Config { max_retries: 5, ..Config::default() };
        assert_eq!(config.retry_policy().max_attempts, 5);
    }
}
