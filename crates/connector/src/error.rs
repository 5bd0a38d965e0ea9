use thiserror::Error;

/// Errors surfaced by [`crate::GatewayConnector::probe`].
///
/// Every variant collapses to the spec's single `UpstreamUnavailable`
/// taxonomy entry (§7) at the federation crate's boundary; the extra
/// granularity here is for logging, not for callers to match on.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("invalid gateway url: {0}")]
    InvalidUrl(String),

    #[error("transport error contacting upstream: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream returned a non-success status: {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed response from upstream: {0}")]
    Protocol(String),
}
