//! Runtime configuration for the checkout services.

use std::time::Duration;

/// Checkout tuning knobs with sensible defaults.
///
/// Reads from environment variables:
/// - `CHECKOUT_MAX_ORDERS_PER_MINUTE` — rate-limit ceiling per user (default: `5`)
/// - `CHECKOUT_COMMIT_RETRIES` — retries after a version conflict (default: `3`)
/// - `CHECKOUT_NOTIFY_TIMEOUT_MS` — notification dispatch bound (default: `2000`)
#[derive(Debug, Clone)]
pub struct Config {
    pub max_orders_per_minute: usize,
    pub commit_retries: u32,
    pub notify_timeout: Duration,
}

impl Config {
    /// Loads configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_orders_per_minute: std::env::var("CHECKOUT_MAX_ORDERS_PER_MINUTE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_orders_per_minute),
            commit_retries: std::env::var("CHECKOUT_COMMIT_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.commit_retries),
            notify_timeout: std::env::var("CHECKOUT_NOTIFY_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.notify_timeout),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_orders_per_minute: 5,
            commit_retries: 3,
            notify_timeout: Duration::from_millis(2000),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = Config::default();
        assert_eq!(config.max_orders_per_minute, 5);
        assert_eq!(config.commit_retries, 3);
        assert_eq!(config.notify_timeout, Duration::from_millis(2000));
    }
}
