//! Checkout configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use crate::error::{CheckoutError, Result};
use crate::poller::PollerConfig;

#[derive(Clone, Debug)]
pub struct CheckoutConfig {
    /// Base URL of the backend API (e.g. http://localhost:8001/api)
    pub backend_url: String,
    /// Storefront origin the payment page redirects back to
    pub origin_url: String,
    /// Per-request timeout for backend calls
    pub request_timeout: Duration,
    /// Payment confirmation polling
    pub poll: PollerConfig,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8001/api".into(),
            origin_url: "http://localhost:3000".into(),
            request_timeout: Duration::from_secs(15),
            poll: PollerConfig::default(),
        }
    }
}

impl CheckoutConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value source; unset keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let timeout_secs = parse_or(
            &lookup,
            "STOREFRONT_HTTP_TIMEOUT_SECS",
            defaults.request_timeout.as_secs(),
        )?;
        let interval_ms = parse_or(
            &lookup,
            "STOREFRONT_POLL_INTERVAL_MS",
            u64::try_from(defaults.poll.interval.as_millis()).unwrap_or(u64::MAX),
        )?;
        let max_attempts =
            parse_or(&lookup, "STOREFRONT_POLL_MAX_ATTEMPTS", defaults.poll.max_attempts)?;

        if max_attempts == 0 {
            return Err(CheckoutError::Config(
                "STOREFRONT_POLL_MAX_ATTEMPTS must be at least 1".into(),
            ));
        }

        Ok(Self {
            backend_url: lookup("STOREFRONT_BACKEND_URL")
                .map_or(defaults.backend_url, |url| url.trim_end_matches('/').to_string()),
            origin_url: lookup("STOREFRONT_ORIGIN_URL")
                .map_or(defaults.origin_url, |url| url.trim_end_matches('/').to_string()),
            request_timeout: Duration::from_secs(timeout_secs),
            poll: PollerConfig {
                max_attempts,
                interval: Duration::from_millis(interval_ms),
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| CheckoutError::Config(format!("Invalid {key}: {raw}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CheckoutConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.backend_url, "http://localhost:8001/api");
        assert_eq!(config.origin_url, "http://localhost:3000");
        assert_eq!(config.poll.max_attempts, 10);
        assert_eq!(config.poll.interval, Duration::from_secs(2));
    }

    #[test]
    fn test_overrides() {
        let config = CheckoutConfig::from_lookup(lookup(&[
            ("STOREFRONT_BACKEND_URL", "https://api.shop.example/api/"),
            ("STOREFRONT_POLL_INTERVAL_MS", "500"),
            ("STOREFRONT_POLL_MAX_ATTEMPTS", "3"),
            ("STOREFRONT_HTTP_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.backend_url, "https://api.shop.example/api");
        assert_eq!(config.poll.interval, Duration::from_millis(500));
        assert_eq!(config.poll.max_attempts, 3);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_malformed_value_is_an_error() {
        let err = CheckoutConfig::from_lookup(lookup(&[("STOREFRONT_POLL_INTERVAL_MS", "soon")]))
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Config(msg) if msg.contains("STOREFRONT_POLL_INTERVAL_MS")
        ));
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let zero = lookup(&[("STOREFRONT_POLL_MAX_ATTEMPTS", "0")]);
        assert!(CheckoutConfig::from_lookup(zero).is_err());
    }
}
