// Upstream sync configuration

use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Default endpoint publishing current fuel prices per station
pub const DEFAULT_PRICES_URL: &str =
    "https://publicacionexterna.azurewebsites.net/publicaciones/prices";

/// Default endpoint publishing the station catalogue
pub const DEFAULT_STATIONS_URL: &str =
    "https://publicacionexterna.azurewebsites.net/publicaciones/places";

/// Default upper bound on one upstream request
pub const DEFAULT_SYNC_TIMEOUT_SECS: u64 = 60;

pub const DEFAULT_USER_AGENT: &str = concat!("GeoGas-Sync/", env!("CARGO_PKG_VERSION"));

/// Configuration for pulling the upstream documents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// URL of the prices document
    pub prices_url: String,

    /// URL of the stations document
    pub stations_url: String,

    /// HTTP timeout in seconds, covering connect and body download
    pub timeout_secs: u64,

    pub user_agent: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            prices_url: DEFAULT_PRICES_URL.to_string(),
            stations_url: DEFAULT_STATIONS_URL.to_string(),
            timeout_secs: DEFAULT_SYNC_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl SyncConfig {
    /// Load from `SYNC_*` environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            prices_url: std::env::var("SYNC_PRICES_URL").unwrap_or(defaults.prices_url),
            stations_url: std::env::var("SYNC_STATIONS_URL").unwrap_or(defaults.stations_url),
            timeout_secs: std::env::var("SYNC_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.timeout_secs),
            user_agent: std::env::var("SYNC_USER_AGENT").unwrap_or(defaults.user_agent),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        validate_url("prices", &self.prices_url)?;
        validate_url("stations", &self.stations_url)?;

        if self.timeout_secs == 0 {
            return Err("Sync timeout must be greater than 0".to_string());
        }

        if self.user_agent.trim().is_empty() {
            return Err("Sync user agent cannot be empty".to_string());
        }

        Ok(())
    }
}

fn validate_url(label: &str, raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|e| format!("Invalid {} URL '{}': {}", label, raw, e))?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("Unsupported scheme '{}' for {} URL", other, label)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SyncConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn test_relative_url_rejected() {
        let config = SyncConfig {
            prices_url: "/publicaciones/prices".to_string(),
            ..SyncConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.contains("prices"));
    }

    #[test]
    fn test_ftp_url_rejected() {
        let config = SyncConfig {
            stations_url: "ftp://example.org/places".to_string(),
            ..SyncConfig::default()
        };
        assert!(config.validate().unwrap_err().contains("ftp"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = SyncConfig {
            timeout_secs: 0,
            ..SyncConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
