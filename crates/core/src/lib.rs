//! Domain types shared by every crate in the gateway federation workspace.
//!
//! This crate performs no I/O. It defines the shapes that the state,
//! connector, and federation crates all agree on: [`Gateway`], [`Tool`],
//! authentication material, lifecycle [`events`](event), and the JSON-RPC
//! envelope used to forward calls to a gateway.

mod auth;
mod event;
mod gateway;
mod ids;
mod rpc;
mod status;
mod tool;

pub use auth::{AuthType, AuthValue};
pub use event::{EventData, EventType, LifecycleEvent};
pub use gateway::{Gateway, GatewayInput, GatewayPatch};
pub use ids::{GatewayId, ToolId};
pub use rpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use status::EntityStatus;
pub use tool::{IntegrationType, Tool, ToolDescriptor};

/// Nested feature-flag map declaring what a gateway (or the federation
/// baseline) supports. Opaque to this service beyond merging (C8).
pub type CapabilityMap = serde_json::Map<String, serde_json::Value>;
