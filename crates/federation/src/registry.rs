use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use fedgate_connector::GatewayConnector;
use fedgate_core::{
    EntityStatus, EventData, EventType, Gateway, GatewayId, GatewayInput, GatewayPatch,
    LifecycleEvent,
};
use fedgate_state::{GatewayRepository, ToolStatusSink};
use tracing::{info, instrument, warn};

use crate::error::FederationError;
use crate::event_bus::EventBus;

/// Tracks the URL of every currently-enabled gateway (I2), so other
/// components never need a full repository scan to answer "is this URL
/// already federated". Keyed by URL; the value is unused, `DashMap` doubling
/// as a concurrent set.
type ActiveUrlSet = DashMap<String, ()>;

/// Gateway Registry (C6): the only component that mutates gateway state.
/// Every public method here corresponds to one named operation.
pub struct Registry {
    repository: Arc<dyn GatewayRepository>,
    tool_sink: Arc<dyn ToolStatusSink>,
    events: Arc<EventBus>,
    connector: Arc<dyn GatewayConnector>,
    active_urls: ActiveUrlSet,
}

impl Registry {
    #[must_use]
    pub fn new(
        repository: Arc<dyn GatewayRepository>,
        tool_sink: Arc<dyn ToolStatusSink>,
        events: Arc<EventBus>,
        connector: Arc<dyn GatewayConnector>,
    ) -> Self {
        Self {
            repository,
            tool_sink,
            events,
            connector,
            active_urls: DashMap::new(),
        }
    }

    /// Rebuild the active-URL set from persisted state. Call once at
    /// startup, before serving traffic, so I2 holds from the first request.
    pub async fn initialize(&self) -> Result<(), FederationError> {
        for gateway in self.repository.list_enabled_gateways().await? {
            self.active_urls.insert(gateway.url, ());
        }
        Ok(())
    }

    /// `register(input) → Gateway` (§4.6).
    #[instrument(skip(self, input), fields(gateway.name = %input.name))]
    pub async fn register(&self, input: GatewayInput) -> Result<Gateway, FederationError> {
        if let Some(existing) = self.repository.find_by_name(&input.name).await? {
            return Err(FederationError::NameConflict {
                name: input.name,
                existing_id: existing.id,
                existing_enabled: existing.is_enabled(),
            });
        }

        let outcome = self
            .connector
            .probe(&input.url, input.auth_type, &input.auth_value)
            .await?;

        let now = Utc::now();
        let gateway = Gateway {
            id: GatewayId::new(),
            name: input.name,
            url: input.url,
            description: input.description,
            capabilities: outcome.capabilities,
            auth_type: input.auth_type,
            auth_value: input.auth_value,
            status: EntityStatus::active(),
            last_seen: Some(now),
            created_at: now,
            updated_at: now,
        };

        let existing_tool_names = self.existing_tool_names().await?;
        let discovered_count = outcome.tools.len();
        let attachable: Vec<_> = outcome
            .tools
            .into_iter()
            .filter(|t| !existing_tool_names.contains(&t.name))
            .collect();
        let skipped = discovered_count - attachable.len();

        let stored = self.repository.insert_gateway(gateway, attachable).await?;

        self.active_urls.insert(stored.url.clone(), ());
        self.publish(EventType::GatewayAdded, &stored);

        if skipped > 0 {
            info!(gateway = %stored.id, skipped, "skipped tool names already owned elsewhere in the fleet");
        }
        Ok(stored)
    }

    /// `update(id, patch)` (§4.6).
    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: GatewayId, patch: GatewayPatch) -> Result<Gateway, FederationError> {
        let current = self
            .repository
            .get_gateway(id)
            .await?
            .filter(Gateway::is_enabled)
            .ok_or_else(|| FederationError::NotFound(id.to_string()))?;

        if patch.changes_name(&current.name) {
            let new_name = patch.name.clone().unwrap_or_default();
            if let Some(existing) = self.repository.find_by_name(&new_name).await? {
                if existing.id != id {
                    return Err(FederationError::NameConflict {
                        name: new_name,
                        existing_id: existing.id,
                        existing_enabled: existing.is_enabled(),
                    });
                }
            }
        }

        let url_changed = patch.changes_url(&current.url);
        let old_url = current.url.clone();
        let probe_auth_type = patch.auth_type.unwrap_or(current.auth_type);
        let probe_auth_value = patch.auth_value.clone().unwrap_or_else(|| current.auth_value.clone());
        let new_url = patch.url.clone().unwrap_or_else(|| current.url.clone());

        let mut updated = self.repository.update_gateway(id, patch).await?;

        if url_changed {
            // The gateway is always enabled here (loaded with `filter(Gateway::is_enabled)`
            // above), so `enabled <=> url in ActiveURLSet` (P1) must hold for `new_url`
            // regardless of whether the re-probe below succeeds.
            self.active_urls.remove(&old_url);
            self.active_urls.insert(new_url.clone(), ());

            match self.connector.probe(&new_url, probe_auth_type, &probe_auth_value).await {
                Ok(outcome) => {
                    let existing_tool_names = self.existing_tool_names().await?;
                    let attachable: Vec<_> = outcome
                        .tools
                        .into_iter()
                        .filter(|t| !existing_tool_names.contains(&t.name))
                        .collect();
                    self.repository.sync_tools(id, attachable).await?;
                    self.repository.mark_seen(id, true).await?;
                    self.repository.update_capabilities(id, outcome.capabilities.clone()).await?;
                    updated.capabilities = outcome.capabilities;
                    updated.last_seen = Some(Utc::now());
                }
                Err(e) => {
                    warn!(gateway = %id, error = %e, "re-probe after URL change failed, keeping prior capabilities");
                }
            }
        }

        self.publish(EventType::GatewayUpdated, &updated);
        Ok(updated)
    }

    /// `toggle(id, enabled)` (§4.6).
    #[instrument(skip(self))]
    pub async fn toggle(&self, id: GatewayId, enabled: bool) -> Result<Gateway, FederationError> {
        let current = self
            .repository
            .get_gateway(id)
            .await?
            .ok_or_else(|| FederationError::NotFound(id.to_string()))?;

        if current.is_enabled() == enabled {
            return Ok(current);
        }

        let mut updated = self.repository.set_gateway_enabled(id, enabled).await?;

        if enabled {
            self.active_urls.insert(updated.url.clone(), ());
            match self
                .connector
                .probe(&updated.url, updated.auth_type, &updated.auth_value)
                .await
            {
                Ok(outcome) => {
                    self.repository.update_capabilities(id, outcome.capabilities.clone()).await?;
                    updated.capabilities = outcome.capabilities;
                    self.repository.mark_seen(id, true).await?;
                    updated.last_seen = Some(Utc::now());
                }
                Err(e) => {
                    warn!(gateway = %id, error = %e, "re-probe on re-enable failed, keeping transition");
                }
            }
        } else {
            self.active_urls.remove(&updated.url);
        }

        for tool in self.repository.list_tools(id).await? {
            self.tool_sink.toggle_tool_status(tool.id, enabled).await?;
        }

        let event_type = if enabled {
            EventType::GatewayActivated
        } else {
            EventType::GatewayDeactivated
        };
        self.publish(event_type, &updated);
        Ok(updated)
    }

    /// `delete(id)` (§4.6).
    #[instrument(skip(self))]
    pub async fn delete(&self, id: GatewayId) -> Result<Gateway, FederationError> {
        let deleted = self.repository.delete_gateway(id).await.map_err(|e| match e {
            fedgate_state::StateError::GatewayNotFound(_) => FederationError::NotFound(id.to_string()),
            other => FederationError::from(other),
        })?;

        self.active_urls.remove(&deleted.url);
        self.publish(EventType::GatewayDeleted, &deleted);
        Ok(deleted)
    }

    pub async fn get(&self, id: GatewayId, include_inactive: bool) -> Result<Gateway, FederationError> {
        let gateway = self
            .repository
            .get_gateway(id)
            .await?
            .ok_or_else(|| FederationError::NotFound(id.to_string()))?;

        if !include_inactive && !gateway.is_enabled() {
            return Err(FederationError::NotFound(id.to_string()));
        }
        Ok(gateway)
    }

    pub async fn list(&self, include_inactive: bool) -> Result<Vec<Gateway>, FederationError> {
        let all = self.repository.list_gateways().await?;
        Ok(if include_inactive {
            all
        } else {
            all.into_iter().filter(Gateway::is_enabled).collect()
        })
    }

    /// Active URLs currently tracked (I2), for the aggregator and forwarder.
    #[must_use]
    pub fn active_urls(&self) -> Vec<String> {
        self.active_urls.iter().map(|e| e.key().clone()).collect()
    }

    async fn existing_tool_names(&self) -> Result<std::collections::HashSet<String>, FederationError> {
        let mut names = std::collections::HashSet::new();
        for gateway in self.repository.list_gateways().await? {
            for tool in self.repository.list_tools(gateway.id).await? {
                names.insert(tool.name);
            }
        }
        Ok(names)
    }

    fn publish(&self, event_type: EventType, gateway: &Gateway) {
        self.events.publish(LifecycleEvent::new(
            event_type,
            EventData {
                id: gateway.id,
                name: gateway.name.clone(),
                url: gateway.url.clone(),
                description: gateway.description.clone(),
                enabled: gateway.is_enabled(),
            },
        ));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use fedgate_connector::{ConnectorError, ProbeOutcome};
    use fedgate_core::{AuthType, AuthValue, ToolDescriptor};
    use fedgate_state_memory::{MemoryGatewayRepository, MemoryToolStatusSink};

    use super::*;

    struct StubConnector {
        tools: Vec<ToolDescriptor>,
        fail: bool,
        // Fails only when probed with this URL, regardless of `fail` -- lets a test
        // succeed on register and then fail on a subsequent re-probe after an update.
        fail_url: Option<String>,
    }

    #[async_trait::async_trait]
    impl GatewayConnector for StubConnector {
        async fn probe(
            &self,
            url: &str,
            _auth_type: AuthType,
            _auth_value: &AuthValue,
        ) -> Result<ProbeOutcome, ConnectorError> {
            if self.fail || self.fail_url.as_deref() == Some(url) {
                return Err(ConnectorError::Protocol("stub failure".into()));
            }
            Ok(ProbeOutcome {
                capabilities: serde_json::Map::new(),
                tools: self.tools.clone(),
            })
        }
    }

    fn make_registry(connector: StubConnector) -> Registry {
        Registry::new(
            Arc::new(MemoryGatewayRepository::default()),
            Arc::new(MemoryToolStatusSink::default()),
            Arc::new(EventBus::new()),
            Arc::new(connector),
        )
    }

    fn sample_input(name: &str) -> GatewayInput {
        GatewayInput {
            name: name.to_owned(),
            url: format!("https://{name}.example"),
            description: String::new(),
            auth_type: AuthType::None,
            auth_value: AuthValue::empty(),
        }
    }

    #[tokio::test]
    async fn register_rejects_duplicate_name() {
        let registry = make_registry(StubConnector { tools: vec![], fail: false, fail_url: None });
        registry.register(sample_input("g1")).await.unwrap();

        let err = registry.register(sample_input("g1")).await.unwrap_err();
        assert!(matches!(err, FederationError::NameConflict { .. }));
    }

    #[tokio::test]
    async fn register_fails_without_writing_on_probe_failure() {
        let registry = make_registry(StubConnector { tools: vec![], fail: true, fail_url: None });
        let err = registry.register(sample_input("g1")).await.unwrap_err();
        assert!(matches!(err, FederationError::UpstreamUnavailable(_)));
        assert!(registry.list(true).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn toggle_disable_then_enable_is_idempotent_and_cascades() {
        let tool = ToolDescriptor {
            name: "search".into(),
            description: String::new(),
            integration_type: fedgate_core::IntegrationType::Mcp,
            request_type: "POST".into(),
            headers: Default::default(),
            input_schema: serde_json::json!({}),
            jsonpath_filter: None,
        };
        let registry = make_registry(StubConnector { tools: vec![tool], fail: false, fail_url: None });
        let gateway = registry.register(sample_input("g1")).await.unwrap();

        let disabled = registry.toggle(gateway.id, false).await.unwrap();
        assert!(!disabled.is_enabled());
        assert!(!registry.active_urls().contains(&gateway.url));

        // No-op toggle to the same state.
        let still_disabled = registry.toggle(gateway.id, false).await.unwrap();
        assert!(!still_disabled.is_enabled());

        let enabled = registry.toggle(gateway.id, true).await.unwrap();
        assert!(enabled.is_enabled());
        assert!(registry.active_urls().contains(&gateway.url));
    }

    #[tokio::test]
    async fn delete_removes_gateway_and_url() {
        let registry = make_registry(StubConnector { tools: vec![], fail: false, fail_url: None });
        let gateway = registry.register(sample_input("g1")).await.unwrap();

        registry.delete(gateway.id).await.unwrap();
        assert!(registry.get(gateway.id, true).await.is_err());
        assert!(!registry.active_urls().contains(&gateway.url));
    }

    #[tokio::test]
    async fn get_hides_disabled_gateway_unless_include_inactive() {
        let registry = make_registry(StubConnector { tools: vec![], fail: false, fail_url: None });
        let gateway = registry.register(sample_input("g1")).await.unwrap();
        registry.toggle(gateway.id, false).await.unwrap();

        assert!(registry.get(gateway.id, false).await.is_err());
        assert!(registry.get(gateway.id, true).await.is_ok());
    }

    #[tokio::test]
    async fn update_url_change_keeps_active_set_consistent_when_reprobe_fails() {
        let new_url = "https://new.example".to_owned();
        let registry = make_registry(StubConnector {
            tools: vec![],
            fail: false,
            fail_url: Some(new_url.clone()),
        });
        let gateway = registry.register(sample_input("g1")).await.unwrap();
        let old_url = gateway.url.clone();

        let updated = registry
            .update(
                gateway.id,
                GatewayPatch {
                    url: Some(new_url.clone()),
                    ..GatewayPatch::default()
                },
            )
            .await
            .unwrap();

        // P1: the gateway stays enabled and its persisted url moves to new_url ...
        assert!(updated.is_enabled());
        assert_eq!(updated.url, new_url);

        // ... so the active set must reflect new_url only, even though the re-probe
        // against it failed (S5).
        let urls = registry.active_urls();
        assert!(urls.contains(&new_url));
        assert!(!urls.contains(&old_url));
    }
}
