use std::time::Duration;

use serde::Deserialize;

use crate::error::FederationError;

/// Recognized configuration options (§6), loaded from TOML with environment
/// overrides by the composition root (`fedgate-federation-server`). Field
/// names match the distilled spec verbatim.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FederationConfig {
    /// Per-request outbound timeout, in seconds.
    pub federation_timeout_seconds: u64,
    /// Disable TLS certificate validation on outbound HTTP. Dev/test only.
    pub skip_ssl_verify: bool,
    /// Consecutive failure count that triggers deactivation. `-1` disables
    /// the auto-deactivation policy.
    pub unhealthy_threshold: i64,
    /// Seconds between health-check cycles.
    pub health_check_interval_seconds: u64,
    /// Leader-elector backend: `redis`, `file`, or `none`.
    pub cache_type: CacheType,
    /// Redis connection string, required when `cache_type = "redis"`.
    pub redis_url: Option<String>,
    /// Advisory lock file path, required when `cache_type = "file"`.
    pub filelock_path: Option<String>,
    /// Credentials the forwarder presents to upstream gateways (§6).
    pub basic_auth_user: String,
    pub basic_auth_password: String,
}

/// Leader elector backend selector (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheType {
    Redis,
    File,
    None,
}

impl Default for FederationConfig {
    fn default() -> Self {
        Self {
            federation_timeout_seconds: 30,
            skip_ssl_verify: false,
            unhealthy_threshold: 3,
            health_check_interval_seconds: 60,
            cache_type: CacheType::None,
            redis_url: None,
            filelock_path: None,
            basic_auth_user: String::new(),
            basic_auth_password: String::new(),
        }
    }
}

impl FederationConfig {
    #[must_use]
    pub fn federation_timeout(&self) -> Duration {
        Duration::from_secs(self.federation_timeout_seconds)
    }

    #[must_use]
    pub fn health_check_interval(&self) -> Duration {
        Duration::from_secs(self.health_check_interval_seconds)
    }

    /// `-1` disables the auto-deactivation policy (P4).
    #[must_use]
    pub fn failure_threshold_disabled(&self) -> bool {
        self.unhealthy_threshold == -1
    }

    /// Validate cross-field requirements that `serde`'s per-field
    /// deserialization cannot express. Called once at startup; never
    /// panics.
    pub fn validate(&self) -> Result<(), FederationError> {
        match self.cache_type {
            CacheType::Redis if self.redis_url.is_none() => Err(FederationError::ConfigurationError(
                "cache_type = \"redis\" requires redis_url".to_owned(),
            )),
            CacheType::File if self.filelock_path.is_none() => Err(FederationError::ConfigurationError(
                "cache_type = \"file\" requires filelock_path".to_owned(),
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        FederationConfig::default().validate().unwrap();
    }

    #[test]
    fn redis_without_url_is_rejected() {
        let cfg = FederationConfig {
            cache_type: CacheType::Redis,
            ..FederationConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn file_without_path_is_rejected() {
        let cfg = FederationConfig {
            cache_type: CacheType::File,
            ..FederationConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
