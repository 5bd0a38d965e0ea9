use std::sync::Arc;
use std::time::Duration;

use fedgate_connector::{GatewayConnector, StreamingHttpConnector};
use fedgate_state::{DistributedLock, GatewayRepository, ToolStatusSink};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_stream::Stream;
use tracing::{info, warn};

use crate::aggregator;
use crate::config::FederationConfig;
use crate::error::FederationError;
use crate::event_bus::EventBus;
use crate::forwarder::Forwarder;
use crate::health::HealthMonitor;
use crate::leader::LeaderElector;
use crate::registry::Registry;

/// The composed federation service: Event Bus (C1), Leader Elector (C4),
/// Health Monitor (C5), Gateway Registry (C6), Request Forwarder (C7), and
/// Capability Aggregator (C8) wired to one shared HTTP client and
/// persistence backend.
///
/// Follows the original's explicit `initialize()`/`shutdown()` lifecycle
/// rather than doing all setup in the constructor: `new` wires dependencies,
/// `initialize` starts the background health loop, `shutdown` stops it.
pub struct FederationService {
    registry: Arc<Registry>,
    forwarder: Arc<Forwarder>,
    health: Arc<HealthMonitor>,
    events: Arc<EventBus>,
    health_task: Mutex<Option<(JoinHandle<()>, watch::Sender<bool>)>>,
}

impl FederationService {
    /// Wire every component from its dependencies. Does not start the
    /// health loop — call [`FederationService::initialize`] for that.
    ///
    /// # Errors
    ///
    /// Returns [`FederationError::ConfigurationError`] if `config` fails
    /// validation.
    pub fn new(
        config: FederationConfig,
        repository: Arc<dyn GatewayRepository>,
        tool_sink: Arc<dyn ToolStatusSink>,
        lock: Arc<dyn DistributedLock>,
    ) -> Result<Self, FederationError> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.federation_timeout())
            .danger_accept_invalid_certs(config.skip_ssl_verify)
            .build()
            .map_err(|e| FederationError::ConfigurationError(e.to_string()))?;

        let events = Arc::new(EventBus::new());
        let connector: Arc<dyn GatewayConnector> = Arc::new(StreamingHttpConnector::new(client.clone()));
        let registry = Arc::new(Registry::new(repository.clone(), tool_sink, Arc::clone(&events), connector));
        let forwarder = Arc::new(Forwarder::new(
            client.clone(),
            config.basic_auth_user.clone(),
            config.basic_auth_password.clone(),
            repository.clone(),
        ));

        // TTL recommended at >= 4x the health cycle (§4.4), so a missed
        // refresh under ordinary scheduling jitter does not cost leadership.
        let lock_ttl = config.health_check_interval() * 4;
        let elector = Arc::new(LeaderElector::new(lock, lock_ttl));
        let health = Arc::new(HealthMonitor::new(repository, Arc::clone(&registry), elector, client, config));

        Ok(Self {
            registry,
            forwarder,
            health,
            events,
            health_task: Mutex::new(None),
        })
    }

    /// Rebuild in-memory state from the repository and start the health
    /// loop task. Idempotent: calling twice is a no-op on the second call.
    pub async fn initialize(&self) -> Result<(), FederationError> {
        self.registry.initialize().await?;

        let mut task = self.health_task.lock().await;
        if task.is_some() {
            return Ok(());
        }

        let (tx, rx) = watch::channel(false);
        let health = Arc::clone(&self.health);
        let handle = tokio::spawn(async move {
            health.run(rx).await;
        });
        *task = Some((handle, tx));
        info!("federation service initialized");
        Ok(())
    }

    /// Cancel the health loop, await its completion, and drop the shared
    /// HTTP client's connection pool along with it.
    pub async fn shutdown(&self) {
        let mut task = self.health_task.lock().await;
        if let Some((handle, tx)) = task.take() {
            let _ = tx.send(true);
            if let Err(e) = handle.await {
                warn!(error = %e, "health loop task panicked during shutdown");
            }
        }
        info!("federation service shut down");
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    #[must_use]
    pub fn forwarder(&self) -> &Arc<Forwarder> {
        &self.forwarder
    }

    /// Subscribe to the lifecycle event stream (C1).
    pub fn subscribe_events(&self) -> impl Stream<Item = fedgate_core::LifecycleEvent> {
        self.events.subscribe()
    }

    /// Aggregate capability map (C8) across every currently enabled gateway.
    pub async fn capabilities(&self) -> Result<fedgate_core::CapabilityMap, FederationError> {
        let active = self.registry.list(false).await?;
        Ok(aggregator::aggregate(&active))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use fedgate_state_memory::{MemoryDistributedLock, MemoryGatewayRepository, MemoryToolStatusSink};

    use super::*;

    fn make_service() -> FederationService {
        FederationService::new(
            FederationConfig::default(),
            Arc::new(MemoryGatewayRepository::default()),
            Arc::new(MemoryToolStatusSink::default()),
            Arc::new(MemoryDistributedLock::new()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn initialize_and_shutdown_is_idempotent_and_clean() {
        let service = make_service();
        service.initialize().await.unwrap();
        service.initialize().await.unwrap();
        service.shutdown().await;
    }

    #[tokio::test]
    async fn capabilities_returns_baseline_with_no_active_gateways() {
        let service = make_service();
        let caps = service.capabilities().await.unwrap();
        assert_eq!(caps["tools"]["listChanged"], true);
    }

    #[test]
    fn rejects_invalid_configuration() {
        let config = FederationConfig {
            cache_type: crate::config::CacheType::Redis,
            ..FederationConfig::default()
        };
        let err = FederationService::new(
            config,
            Arc::new(MemoryGatewayRepository::default()),
            Arc::new(MemoryToolStatusSink::default()),
            Arc::new(MemoryDistributedLock::new()),
        )
        .unwrap_err();
        assert!(matches!(err, FederationError::ConfigurationError(_)));
    }
}
