use async_trait::async_trait;
use fedgate_core::{Gateway, GatewayId, GatewayPatch, Tool, ToolDescriptor, ToolId};

use crate::error::StateError;

/// Persistence boundary for the gateway registry (C6).
///
/// Implementations own gateway and tool storage; they do not make
/// federation policy decisions (name-conflict checks, re-probing,
/// cascading tool toggles) — those live in the federation crate and call
/// through this trait.
#[async_trait]
pub trait GatewayRepository: Send + Sync {
    /// Insert a new gateway together with the tools discovered by its
    /// initial probe. Returns the stored gateway.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::NameConflict`] if a gateway with the same name
    /// already exists, active or not (I1).
    async fn insert_gateway(
        &self,
        gateway: Gateway,
        tools: Vec<ToolDescriptor>,
    ) -> Result<Gateway, StateError>;

    /// Apply a patch to an existing gateway. Returns the updated gateway.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::GatewayNotFound`] if no gateway with this id
    /// exists, or [`StateError::NameConflict`] if the patch renames the
    /// gateway to a name already in use by another gateway.
    async fn update_gateway(
        &self,
        id: GatewayId,
        patch: GatewayPatch,
    ) -> Result<Gateway, StateError>;

    /// Replace the tool set attached to a gateway, e.g. after a re-probe
    /// triggered by a URL change. Tool names already registered under this
    /// gateway are left untouched; only names absent from the current set
    /// are inserted (I2's existing-tool-name filter).
    async fn sync_tools(
        &self,
        gateway_id: GatewayId,
        discovered: Vec<ToolDescriptor>,
    ) -> Result<(), StateError>;

    /// Flip `enabled` on a gateway. Does not touch `reachable`.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::GatewayNotFound`] if no gateway with this id
    /// exists.
    async fn set_gateway_enabled(&self, id: GatewayId, enabled: bool) -> Result<Gateway, StateError>;

    /// Record the outcome of a health probe or forwarded call against this
    /// gateway's liveness.
    async fn mark_seen(&self, id: GatewayId, reachable: bool) -> Result<(), StateError>;

    /// Persist a freshly re-probed capability map, e.g. after a successful
    /// re-probe triggered by a URL change (§4.6 step 4) or a re-enable
    /// (§4.6 step 3).
    async fn update_capabilities(
        &self,
        id: GatewayId,
        capabilities: fedgate_core::CapabilityMap,
    ) -> Result<(), StateError>;

    /// Delete a gateway and cascade-delete every tool it owns (I3).
    ///
    /// # Errors
    ///
    /// Returns [`StateError::GatewayNotFound`] if no gateway with this id
    /// exists.
    async fn delete_gateway(&self, id: GatewayId) -> Result<Gateway, StateError>;

    async fn get_gateway(&self, id: GatewayId) -> Result<Option<Gateway>, StateError>;

    async fn find_by_name(&self, name: &str) -> Result<Option<Gateway>, StateError>;

    async fn list_gateways(&self) -> Result<Vec<Gateway>, StateError>;

    /// All gateways with `status.enabled == true`, the set the health
    /// monitor and forwarder operate over.
    async fn list_enabled_gateways(&self) -> Result<Vec<Gateway>, StateError>;

    async fn list_tools(&self, gateway_id: GatewayId) -> Result<Vec<Tool>, StateError>;
}

/// Narrow boundary into the tool service, used only to cascade an
/// enabled/disabled toggle from a gateway to the tools it owns (§4.7 step
/// 3). Kept separate from [`GatewayRepository`] because a deployment may
/// run the tool service as a distinct component.
#[async_trait]
pub trait ToolStatusSink: Send + Sync {
    async fn toggle_tool_status(&self, tool_id: ToolId, enabled: bool) -> Result<(), StateError>;
}
