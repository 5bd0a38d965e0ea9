use fedgate_core::GatewayId;
use thiserror::Error;

/// Error taxonomy for the federation service (§7).
#[derive(Debug, Error)]
pub enum FederationError {
    /// Gateway id absent, or present but disabled when `include_inactive` is
    /// false.
    #[error("gateway not found: {0}")]
    NotFound(String),

    /// Unique-name violation (I1).
    #[error("gateway name already in use: {name} (existing id {existing_id}, enabled={existing_enabled})")]
    NameConflict {
        name: String,
        existing_id: GatewayId,
        existing_enabled: bool,
    },

    /// Cannot reach or negotiate with a gateway.
    #[error("upstream gateway unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Gateway returned a protocol-level error envelope.
    #[error("upstream gateway returned an error: {0}")]
    UpstreamError(String),

    /// Attempt to forward to a disabled gateway.
    #[error("cannot forward to a disabled gateway: {0}")]
    ForwardingRejected(String),

    /// Invalid or missing required configuration at startup.
    #[error("configuration error: {0}")]
    ConfigurationError(String),

    #[error("persistence error: {0}")]
    State(#[from] fedgate_state::StateError),
}

impl From<fedgate_connector::ConnectorError> for FederationError {
    fn from(err: fedgate_connector::ConnectorError) -> Self {
        Self::UpstreamUnavailable(err.to_string())
    }
}
