//! Configuration Module
//!
//! Handles loading and validating configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

// == Defaults ==
/// Default maximum age of a cached entry, in seconds (1 hour)
pub const DEFAULT_TTL_SECS: u64 = 60 * 60;
/// Default period between background sweeps, in seconds (15 minutes)
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 15 * 60;
/// Default maximum number of cached entries
pub const DEFAULT_MAX_ENTRIES: usize = 100;
/// Default gateway port
pub const DEFAULT_SERVER_PORT: u16 = 3002;
/// Default base URL of the exam REST API
pub const DEFAULT_UPSTREAM_URL: &str = "http://localhost:3001/api";
/// Default upstream request timeout, in seconds
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;

// == Config Error ==
/// Reasons a configuration is rejected.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max_entries must be at least 1")]
    ZeroCapacity,

    #[error("ttl must be greater than zero")]
    ZeroTtl,

    #[error("sweep interval must be greater than zero")]
    ZeroSweepInterval,

    #[error("sweep interval ({sweep_interval:?}) must be shorter than the ttl ({ttl:?})")]
    SweepNotShorterThanTtl {
        sweep_interval: Duration,
        ttl: Duration,
    },

    #[error("upstream url cannot be empty")]
    EmptyUpstreamUrl,
}

// == Cache Config ==
/// Settings for a single TTL cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum age of a valid entry
    pub ttl: Duration,
    /// Period between background expiry passes
    pub sweep_interval: Duration,
    /// Hard cap on stored entries
    pub max_entries: usize,
}

impl CacheConfig {
    /// Checks that the sweep runs more often than entries expire and that the
    /// cache can hold at least one entry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_entries == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.ttl.is_zero() {
            return Err(ConfigError::ZeroTtl);
        }
        if self.sweep_interval.is_zero() {
            return Err(ConfigError::ZeroSweepInterval);
        }
        if self.sweep_interval >= self.ttl {
            return Err(ConfigError::SweepNotShorterThanTtl {
                sweep_interval: self.sweep_interval,
                ttl: self.ttl,
            });
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

// == Config ==
/// Gateway configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum age of a cached response in seconds
    pub cache_ttl: u64,
    /// Background sweep interval in seconds
    pub sweep_interval: u64,
    /// Maximum number of cached responses
    pub max_entries: usize,
    /// HTTP server port
    pub server_port: u16,
    /// Base URL of the exam REST API
    pub upstream_url: String,
    /// Upstream request timeout in seconds
    pub upstream_timeout: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_TTL_SECS` - Entry TTL in seconds (default: 3600)
    /// - `SWEEP_INTERVAL_SECS` - Sweep period in seconds (default: 900)
    /// - `MAX_ENTRIES` - Maximum cache entries (default: 100)
    /// - `SERVER_PORT` - HTTP server port (default: 3002)
    /// - `UPSTREAM_URL` - Exam API base URL (default: http://localhost:3001/api)
    /// - `UPSTREAM_TIMEOUT_SECS` - Upstream request timeout (default: 10)
    ///
    /// Unset or unparsable values fall back to the default.
    pub fn from_env() -> Self {
        Self {
            cache_ttl: env_or("CACHE_TTL_SECS", DEFAULT_TTL_SECS),
            sweep_interval: env_or("SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS),
            max_entries: env_or("MAX_ENTRIES", DEFAULT_MAX_ENTRIES),
            server_port: env_or("SERVER_PORT", DEFAULT_SERVER_PORT),
            upstream_url: env::var("UPSTREAM_URL")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_UPSTREAM_URL.to_string()),
            upstream_timeout: env_or("UPSTREAM_TIMEOUT_SECS", DEFAULT_UPSTREAM_TIMEOUT_SECS),
        }
    }

    /// Projects the cache settings.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            ttl: Duration::from_secs(self.cache_ttl),
            sweep_interval: Duration::from_secs(self.sweep_interval),
            max_entries: self.max_entries,
        }
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout)
    }

    /// Rejects configurations the cache or upstream client cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upstream_url.trim().is_empty() {
            return Err(ConfigError::EmptyUpstreamUrl);
        }
        self.cache_config().validate()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_TTL_SECS,
            sweep_interval: DEFAULT_SWEEP_INTERVAL_SECS,
            max_entries: DEFAULT_MAX_ENTRIES,
            server_port: DEFAULT_SERVER_PORT,
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT_SECS,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.cache_ttl, 3600);
        assert_eq!(config.sweep_interval, 900);
        assert_eq!(config.max_entries, 100);
        assert_eq!(config.server_port, 3002);
        assert_eq!(config.upstream_url, "http://localhost:3001/api");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("CACHE_TTL_SECS");
        env::remove_var("SWEEP_INTERVAL_SECS");
        env::remove_var("MAX_ENTRIES");
        env::remove_var("SERVER_PORT");
        env::remove_var("UPSTREAM_URL");
        env::remove_var("UPSTREAM_TIMEOUT_SECS");

        let config = Config::from_env();
        assert_eq!(config.cache_ttl, 3600);
        assert_eq!(config.sweep_interval, 900);
        assert_eq!(config.max_entries, 100);
        assert_eq!(config.server_port, 3002);
        assert_eq!(config.upstream_timeout, 10);
    }

    #[test]
    fn test_cache_config_projection() {
        let config = Config::default();
        assert_eq!(config.cache_config(), CacheConfig::default());
        assert_eq!(config.upstream_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_validate_rejects_slow_sweep() {
        let config = CacheConfig {
            ttl: Duration::from_secs(60),
            sweep_interval: Duration::from_secs(60),
            max_entries: 10,
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SweepNotShorterThanTtl { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let base = CacheConfig::default();

        let zero_cap = CacheConfig { max_entries: 0, ..base.clone() };
        assert_eq!(zero_cap.validate(), Err(ConfigError::ZeroCapacity));

        let zero_ttl = CacheConfig { ttl: Duration::ZERO, ..base.clone() };
        assert_eq!(zero_ttl.validate(), Err(ConfigError::ZeroTtl));

        let zero_sweep = CacheConfig { sweep_interval: Duration::ZERO, ..base };
        assert_eq!(zero_sweep.validate(), Err(ConfigError::ZeroSweepInterval));
    }

    #[test]
    fn test_validate_rejects_empty_upstream() {
        let config = Config {
            upstream_url: "  ".to_string(),
            ..Config::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyUpstreamUrl));
    }
}
