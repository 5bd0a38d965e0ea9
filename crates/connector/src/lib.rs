//! Upstream Connector (C2) and Auth Header Encoder (C3).
//!
//! [`GatewayConnector`] is the trait boundary the federation crate calls
//! through to probe a gateway at registration time and on URL change;
//! [`StreamingHttpConnector`] is the `reqwest`-based implementation. Auth
//! header encoding (`encode`) is exposed separately because the health
//! monitor and request forwarder need it without going through a full
//! probe.

mod auth;
mod error;
mod streaming;

pub use auth::{encode, encode_service_credentials};
pub use error::ConnectorError;
pub use streaming::{GatewayConnector, ProbeOutcome, StreamingHttpConnector};
