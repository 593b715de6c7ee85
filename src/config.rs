//! Configuration Module
//!
//! Handles loading cache configuration from environment variables or any
//! serde-compatible source.

use std::env;
use std::time::Duration;

use serde::Deserialize;

/// Cache configuration parameters.
///
/// Every limit is optional: a missing capacity means unbounded, a missing
/// default TTL means entries never expire unless given one explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum number of entries before LRU eviction kicks in
    pub capacity: Option<usize>,
    /// Default TTL in milliseconds for entries set without an override
    pub default_ttl_ms: Option<u64>,
    /// Interval in milliseconds between background prune sweeps
    pub prune_interval_ms: Option<u64>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `FUNNEL_CACHE_CAPACITY` - Maximum cache entries (default: unbounded)
    /// - `FUNNEL_CACHE_DEFAULT_TTL_MS` - Default TTL in ms (default: none)
    /// - `FUNNEL_CACHE_PRUNE_INTERVAL_MS` - Prune frequency in ms (default: none)
    ///
    /// Unparseable values are ignored and treated as unset.
    pub fn from_env() -> Self {
        Self {
            capacity: env::var("FUNNEL_CACHE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok()),
            default_ttl_ms: env::var("FUNNEL_CACHE_DEFAULT_TTL_MS")
                .ok()
                .and_then(|v| v.parse().ok()),
            prune_interval_ms: env::var("FUNNEL_CACHE_PRUNE_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok()),
        }
    }

    /// Default TTL as a `Duration`.
    pub fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl_ms.map(Duration::from_millis)
    }

    /// Prune interval as a `Duration`, if background pruning is wanted.
    pub fn prune_interval(&self) -> Option<Duration> {
        self.prune_interval_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.capacity, None);
        assert_eq!(config.default_ttl(), None);
        assert_eq!(config.prune_interval(), None);
    }

    #[test]
    fn test_config_from_env() {
        env::set_var("FUNNEL_CACHE_CAPACITY", "500");
        env::set_var("FUNNEL_CACHE_DEFAULT_TTL_MS", "1500");
        env::set_var("FUNNEL_CACHE_PRUNE_INTERVAL_MS", "not-a-number");

        let config = Config::from_env();
        assert_eq!(config.capacity, Some(500));
        assert_eq!(config.default_ttl(), Some(Duration::from_millis(1500)));
        assert_eq!(config.prune_interval(), None);

        env::remove_var("FUNNEL_CACHE_CAPACITY");
        env::remove_var("FUNNEL_CACHE_DEFAULT_TTL_MS");
        env::remove_var("FUNNEL_CACHE_PRUNE_INTERVAL_MS");
    }

    #[test]
    fn test_config_deserialize_partial() {
        let config: Config = serde_json::from_str(r#"{"capacity": 10}"#).unwrap();
        assert_eq!(config.capacity, Some(10));
        assert_eq!(config.default_ttl_ms, None);
    }

    #[test]
    fn test_zero_prune_interval_disables_pruning() {
        let config = Config {
            prune_interval_ms: Some(0),
            ..Config::default()
        };
        assert_eq!(config.prune_interval(), None);
    }
}
