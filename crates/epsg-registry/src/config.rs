//! Registry configuration loaded from the environment.

use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://apps.epsg.org/api/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Cached definitions live for seven days.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 7 * 24 * 60 * 60;
pub const DEFAULT_CACHE_PREFIX: &str = "epsg_api_axis_order_";

#[derive(Debug, Clone, PartialEq)]
pub struct RegistryConfig {
    /// Base URL of the EPSG API, without trailing slash.
    pub api_url: String,
    /// Upper bound for one remote lookup.
    pub timeout: Duration,
    pub cache_ttl: Duration,
    pub cache_prefix: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            cache_prefix: DEFAULT_CACHE_PREFIX.to_string(),
        }
    }
}

impl RegistryConfig {
    /// Load from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - EPSG_API_URL
    /// - EPSG_API_TIMEOUT_SECS (default: 10)
    /// - EPSG_CACHE_TTL_SECS (default: 604800)
    /// - EPSG_CACHE_PREFIX (default: epsg_api_axis_order_)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_url: std::env::var("EPSG_API_URL")
                .ok()
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_url),
            timeout: std::env::var("EPSG_API_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            cache_ttl: std::env::var("EPSG_CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.cache_ttl),
            cache_prefix: std::env::var("EPSG_CACHE_PREFIX").unwrap_or(defaults.cache_prefix),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Cache key for an SRID.
    pub fn cache_key(&self, srid: u32) -> String {
        format!("{}{}", self.cache_prefix, srid)
    }
}
