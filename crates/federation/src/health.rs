use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use fedgate_core::GatewayId;
use fedgate_state::GatewayRepository;
use tracing::{debug, info, instrument, warn};

use crate::config::FederationConfig;
use crate::leader::LeaderElector;
use crate::registry::Registry;

/// Consecutive-failure counters, keyed by gateway id. Reset to zero on any
/// success; a gateway the monitor has never probed has no entry.
type FailureCounters = DashMap<GatewayId, i64>;

/// Health Monitor (C5): while this process holds leadership (C4), probes
/// every enabled gateway once per cycle and deactivates any gateway whose
/// consecutive-failure count reaches `unhealthy_threshold`.
pub struct HealthMonitor {
    repository: Arc<dyn GatewayRepository>,
    registry: Arc<Registry>,
    elector: Arc<LeaderElector>,
    client: reqwest::Client,
    config: FederationConfig,
    failures: FailureCounters,
}

impl HealthMonitor {
    #[must_use]
    pub fn new(
        repository: Arc<dyn GatewayRepository>,
        registry: Arc<Registry>,
        elector: Arc<LeaderElector>,
        client: reqwest::Client,
        config: FederationConfig,
    ) -> Self {
        Self {
            repository,
            registry,
            elector,
            client,
            config,
            failures: DashMap::new(),
        }
    }

    /// Run the monitor loop until `shutdown` resolves. Cooperative
    /// cancellation: a cycle already in flight finishes probing (bounded by
    /// each probe's own timeout) before the loop observes shutdown.
    pub async fn run(&self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        loop {
            tokio::select! {
                () = tokio::time::sleep(self.config.health_check_interval()) => {}
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        debug!("health monitor stopping");
                        return;
                    }
                }
            }

            if *shutdown.borrow() {
                return;
            }

            if !self.elector.tick().await {
                debug!("not leader this cycle, skipping health probes");
                continue;
            }

            self.run_cycle().await;
        }
    }

    #[instrument(skip(self))]
    async fn run_cycle(&self) {
        let actives = match self.repository.list_enabled_gateways().await {
            Ok(gateways) => gateways,
            Err(e) => {
                warn!(error = %e, "failed to load active gateways for health cycle");
                return;
            }
        };

        let probes = actives.into_iter().map(|gateway| self.probe_one(gateway));
        futures::future::join_all(probes).await;
    }

    async fn probe_one(&self, gateway: fedgate_core::Gateway) {
        let headers = fedgate_connector::encode(gateway.auth_type, &gateway.auth_value);
        let mut request = self.client.get(&gateway.url).timeout(self.config.federation_timeout());
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let outcome = request.send().await;
        match outcome {
            Ok(response) if response.status().is_success() => {
                self.failures.remove(&gateway.id);
                if let Err(e) = self.repository.mark_seen(gateway.id, true).await {
                    warn!(gateway = %gateway.id, error = %e, "failed to record health probe success");
                }
            }
            Ok(response) => {
                warn!(gateway = %gateway.id, status = %response.status(), "health probe returned non-success status");
                self.record_failure(gateway.id).await;
            }
            Err(e) => {
                warn!(gateway = %gateway.id, error = %e, "health probe transport failure");
                self.record_failure(gateway.id).await;
            }
        }
    }

    async fn record_failure(&self, id: GatewayId) {
        if let Err(e) = self.repository.mark_seen(id, false).await {
            warn!(gateway = %id, error = %e, "failed to record health probe failure");
        }

        if self.config.failure_threshold_disabled() {
            // Counter is intentionally not advanced: a threshold of -1 means
            // the policy never fires, so there is nothing to count toward.
            return;
        }

        let mut entry = self.failures.entry(id).or_insert(0);
        *entry += 1;
        let count = *entry;
        drop(entry);

        if count >= self.config.unhealthy_threshold {
            info!(gateway = %id, count, "unhealthy threshold reached, deactivating gateway");
            self.failures.remove(&id);
            if let Err(e) = self.registry.toggle(id, false).await {
                warn!(gateway = %id, error = %e, "failed to auto-deactivate unhealthy gateway");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use fedgate_core::{AuthType, AuthValue, Gateway, GatewayId, EntityStatus};
    use fedgate_state_memory::{MemoryDistributedLock, MemoryGatewayRepository, MemoryToolStatusSink};

    use super::*;
    use crate::event_bus::EventBus;

    fn make_registry(repo: Arc<dyn GatewayRepository>) -> Arc<Registry> {
        let sink = Arc::new(MemoryToolStatusSink::default());
        let bus = Arc::new(EventBus::new());
        Arc::new(Registry::new(
            repo,
            sink,
            bus,
            Arc::new(fedgate_connector::StreamingHttpConnector::new(reqwest::Client::new())),
        ))
    }

    fn make_monitor(
        repo: Arc<dyn GatewayRepository>,
        registry: Arc<Registry>,
        threshold: i64,
    ) -> HealthMonitor {
        let elector = Arc::new(LeaderElector::new(
            Arc::new(MemoryDistributedLock::new()),
            Duration::from_secs(10),
        ));
        let config = FederationConfig {
            unhealthy_threshold: threshold,
            ..FederationConfig::default()
        };
        HealthMonitor::new(repo, registry, elector, reqwest::Client::new(), config)
    }

    async fn seed_gateway(repo: &dyn GatewayRepository, url: String) -> GatewayId {
        let now = chrono::Utc::now();
        let gateway = Gateway {
            id: GatewayId::new(),
            name: "flaky".into(),
            url,
            description: String::new(),
            capabilities: Default::default(),
            auth_type: AuthType::None,
            auth_value: AuthValue::empty(),
            status: EntityStatus::active(),
            last_seen: None,
            created_at: now,
            updated_at: now,
        };
        let id = gateway.id;
        repo.insert_gateway(gateway, Vec::new()).await.unwrap();
        id
    }

    #[tokio::test]
    async fn unreachable_gateway_is_deactivated_after_threshold() {
        let mut server = mockito::Server::new_async().await;
        let down = server.mock("GET", "/").with_status(500).expect(3).create_async().await;

        let repo: Arc<dyn GatewayRepository> = Arc::new(MemoryGatewayRepository::default());
        let id = seed_gateway(repo.as_ref(), server.url()).await;
        let registry = make_registry(Arc::clone(&repo));
        let monitor = make_monitor(Arc::clone(&repo), Arc::clone(&registry), 3);

        monitor.run_cycle().await;
        monitor.run_cycle().await;
        assert!(repo.get_gateway(id).await.unwrap().unwrap().is_enabled());

        monitor.run_cycle().await;
        down.assert_async().await;
        assert!(!repo.get_gateway(id).await.unwrap().unwrap().is_enabled());
    }

    #[tokio::test]
    async fn successful_probe_clears_failure_counter() {
        let mut server = mockito::Server::new_async().await;
        let up = server.mock("GET", "/").with_status(200).expect(1).create_async().await;

        let repo: Arc<dyn GatewayRepository> = Arc::new(MemoryGatewayRepository::default());
        let id = seed_gateway(repo.as_ref(), server.url()).await;
        let registry = make_registry(Arc::clone(&repo));
        let monitor = make_monitor(Arc::clone(&repo), Arc::clone(&registry), 2);

        monitor.failures.insert(id, 1);
        monitor.run_cycle().await;
        up.assert_async().await;

        assert!(repo.get_gateway(id).await.unwrap().unwrap().is_enabled());
        assert!(monitor.failures.get(&id).is_none());
    }

    #[test]
    fn disabled_threshold_never_triggers() {
        let config = FederationConfig {
            unhealthy_threshold: -1,
            ..FederationConfig::default()
        };
        assert!(config.failure_threshold_disabled());
    }
}
