use serde::Deserialize;

use fedgate_federation::FederationConfig;

/// Top-level configuration for the federation server, loaded from a TOML
/// file with CLI overrides layered on top.
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Federation service configuration (§6), forwarded to
    /// `FederationConfig` verbatim.
    #[serde(flatten)]
    pub federation: FederationConfig,
}

/// HTTP server bind configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

fn default_port() -> u16 {
    8080
}
