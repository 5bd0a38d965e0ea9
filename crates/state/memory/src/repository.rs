use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use fedgate_core::{Gateway, GatewayId, GatewayPatch, Tool, ToolDescriptor, ToolId};
use fedgate_state::{GatewayRepository, StateError, ToolStatusSink};

/// In-memory [`GatewayRepository`], used for tests and the spec's
/// degenerate zero-external-dependency deployment.
///
/// Mutations on a single gateway id are serialized by `DashMap`'s
/// per-shard locking, matching the "single transaction per public
/// operation" discipline §5 asks of a real backend closely enough for
/// test purposes.
#[derive(Debug, Clone, Default)]
pub struct MemoryGatewayRepository {
    gateways: Arc<DashMap<GatewayId, Gateway>>,
    tools: Arc<DashMap<GatewayId, Vec<Tool>>>,
    /// Global tool-name index, enforcing the fleet-wide uniqueness that
    /// `register`/`update` rely on to decide which discovered tools to
    /// attach (§4.6 step 3, I1, P7).
    tool_names: Arc<DashMap<String, ToolId>>,
}

impl MemoryGatewayRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn name_taken(&self, name: &str, excluding: Option<GatewayId>) -> bool {
        self.gateways
            .iter()
            .any(|entry| entry.name == name && Some(entry.id) != excluding)
    }

    /// Attach only the descriptors whose names are not already present
    /// anywhere in the fleet (§4.6 step 3's "pre-existing tool" rule).
    fn attach_new_tools(&self, gateway: &Gateway, discovered: Vec<ToolDescriptor>) -> Vec<Tool> {
        let mut attached = Vec::new();
        for descriptor in discovered {
            if self.tool_names.contains_key(&descriptor.name) {
                continue;
            }
            let tool = descriptor.into_tool(
                gateway.id,
                &gateway.url,
                gateway.auth_type,
                gateway.auth_value.clone(),
            );
            self.tool_names.insert(tool.name.clone(), tool.id);
            attached.push(tool);
        }
        attached
    }
}

#[async_trait]
impl GatewayRepository for MemoryGatewayRepository {
    async fn insert_gateway(
        &self,
        gateway: Gateway,
        tools: Vec<ToolDescriptor>,
    ) -> Result<Gateway, StateError> {
        if self.name_taken(&gateway.name, None) {
            return Err(StateError::NameConflict(gateway.name));
        }

        let attached = self.attach_new_tools(&gateway, tools);
        self.tools.insert(gateway.id, attached);
        self.gateways.insert(gateway.id, gateway.clone());
        Ok(gateway)
    }

    async fn update_gateway(
        &self,
        id: GatewayId,
        patch: GatewayPatch,
    ) -> Result<Gateway, StateError> {
        let mut entry = self
            .gateways
            .get_mut(&id)
            .ok_or_else(|| StateError::GatewayNotFound(id.to_string()))?;

        if let Some(new_name) = &patch.name {
            if new_name != &entry.name && self.name_taken(new_name, Some(id)) {
                return Err(StateError::NameConflict(new_name.clone()));
            }
            entry.name = new_name.clone();
        }
        if let Some(url) = patch.url {
            entry.url = url;
        }
        if let Some(description) = patch.description {
            entry.description = description;
        }
        if let Some(auth_type) = patch.auth_type {
            entry.auth_type = auth_type;
        }
        if let Some(auth_value) = patch.auth_value {
            entry.auth_value = auth_value;
        }
        entry.updated_at = chrono::Utc::now();
        Ok(entry.clone())
    }

    async fn sync_tools(
        &self,
        gateway_id: GatewayId,
        discovered: Vec<ToolDescriptor>,
    ) -> Result<(), StateError> {
        let gateway = self
            .gateways
            .get(&gateway_id)
            .ok_or_else(|| StateError::GatewayNotFound(gateway_id.to_string()))?
            .clone();

        let mut new_tools = self.attach_new_tools(&gateway, discovered);
        self.tools
            .entry(gateway_id)
            .or_default()
            .append(&mut new_tools);
        Ok(())
    }

    async fn set_gateway_enabled(&self, id: GatewayId, enabled: bool) -> Result<Gateway, StateError> {
        let mut entry = self
            .gateways
            .get_mut(&id)
            .ok_or_else(|| StateError::GatewayNotFound(id.to_string()))?;
        entry.status.enabled = enabled;
        entry.updated_at = chrono::Utc::now();
        Ok(entry.clone())
    }

    async fn mark_seen(&self, id: GatewayId, reachable: bool) -> Result<(), StateError> {
        let mut entry = self
            .gateways
            .get_mut(&id)
            .ok_or_else(|| StateError::GatewayNotFound(id.to_string()))?;
        entry.status.reachable = reachable;
        if reachable {
            entry.last_seen = Some(chrono::Utc::now());
        }
        Ok(())
    }

    async fn update_capabilities(
        &self,
        id: GatewayId,
        capabilities: fedgate_core::CapabilityMap,
    ) -> Result<(), StateError> {
        let mut entry = self
            .gateways
            .get_mut(&id)
            .ok_or_else(|| StateError::GatewayNotFound(id.to_string()))?;
        entry.capabilities = capabilities;
        Ok(())
    }

    async fn delete_gateway(&self, id: GatewayId) -> Result<Gateway, StateError> {
        let (_, gateway) = self
            .gateways
            .remove(&id)
            .ok_or_else(|| StateError::GatewayNotFound(id.to_string()))?;

        if let Some((_, tools)) = self.tools.remove(&id) {
            for tool in tools {
                self.tool_names.remove(&tool.name);
            }
        }
        Ok(gateway)
    }

    async fn get_gateway(&self, id: GatewayId) -> Result<Option<Gateway>, StateError> {
        Ok(self.gateways.get(&id).map(|g| g.clone()))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Gateway>, StateError> {
        Ok(self
            .gateways
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.clone()))
    }

    async fn list_gateways(&self) -> Result<Vec<Gateway>, StateError> {
        Ok(self.gateways.iter().map(|entry| entry.clone()).collect())
    }

    async fn list_enabled_gateways(&self) -> Result<Vec<Gateway>, StateError> {
        Ok(self
            .gateways
            .iter()
            .filter(|entry| entry.status.enabled)
            .map(|entry| entry.clone())
            .collect())
    }

    async fn list_tools(&self, gateway_id: GatewayId) -> Result<Vec<Tool>, StateError> {
        Ok(self
            .tools
            .get(&gateway_id)
            .map(|tools| tools.clone())
            .unwrap_or_default())
    }
}

/// In-memory [`ToolStatusSink`], usable as a drop-in for the real Tool
/// Service in tests and the degenerate deployment. Records the toggles it
/// was asked to apply.
#[derive(Debug, Clone, Default)]
pub struct MemoryToolStatusSink {
    toggled: Arc<DashMap<ToolId, bool>>,
}

impl MemoryToolStatusSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every `(tool_id, enabled)` toggle applied so far.
    #[must_use]
    pub fn applied(&self) -> HashSet<(ToolId, bool)> {
        self.toggled.iter().map(|e| (*e.key(), *e.value())).collect()
    }
}

#[async_trait]
impl ToolStatusSink for MemoryToolStatusSink {
    async fn toggle_tool_status(&self, tool_id: ToolId, enabled: bool) -> Result<(), StateError> {
        self.toggled.insert(tool_id, enabled);
        Ok(())
    }
}
