use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by a [`GatewayRepository`](crate::GatewayRepository),
/// [`ToolStatusSink`](crate::ToolStatusSink), or [`DistributedLock`](crate::DistributedLock)
/// implementation.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("gateway not found: {0}")]
    GatewayNotFound(String),

    #[error("gateway name already in use: {0}")]
    NameConflict(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("lock expired: {0}")]
    LockExpired(String),

    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
