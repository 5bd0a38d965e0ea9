use std::sync::Arc;

use fedgate_core::{Gateway, JsonRpcRequest, JsonRpcResponse};
use fedgate_state::GatewayRepository;
use tracing::{instrument, warn};

use crate::error::FederationError;

/// Request Forwarder (C7): relays a JSON-RPC call to an upstream gateway
/// using the federation's own service identity, not the gateway's stored
/// auth (§4.7 step 3 — "the local control-plane identifies itself").
pub struct Forwarder {
    client: reqwest::Client,
    service_user: String,
    service_password: String,
    repository: Arc<dyn GatewayRepository>,
}

impl Forwarder {
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        service_user: String,
        service_password: String,
        repository: Arc<dyn GatewayRepository>,
    ) -> Self {
        Self {
            client,
            service_user,
            service_password,
            repository,
        }
    }

    /// `forward(gateway, method, params) → result` (§4.7).
    #[instrument(skip(self, params), fields(gateway.id = %gateway.id, method = %method))]
    pub async fn forward(
        &self,
        gateway: &Gateway,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, FederationError> {
        if !gateway.is_enabled() {
            return Err(FederationError::ForwardingRejected(gateway.id.to_string()));
        }

        let envelope = JsonRpcRequest::new(serde_json::json!(1), method, params);
        let headers = fedgate_connector::encode_service_credentials(&self.service_user, &self.service_password);

        let url = format!("{}/rpc", gateway.url.trim_end_matches('/'));
        let mut request = self.client.post(&url).json(&envelope);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| FederationError::UpstreamUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FederationError::UpstreamUnavailable(format!(
                "gateway responded with status {}",
                response.status()
            )));
        }

        let body: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| FederationError::UpstreamUnavailable(e.to_string()))?;

        if let Some(error) = body.error {
            return Err(FederationError::UpstreamError(error.message));
        }

        // §4.7 step 6: a successful forward refreshes last_seen, same as a
        // successful health probe (§4.5) -- both are evidence the gateway is alive.
        if let Err(e) = self.repository.mark_seen(gateway.id, true).await {
            warn!(gateway = %gateway.id, error = %e, "failed to refresh last_seen after forward");
        }

        Ok(body.result.unwrap_or(serde_json::Value::Null))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use fedgate_core::{AuthType, AuthValue, EntityStatus, GatewayId};
    use fedgate_state_memory::MemoryGatewayRepository;

    use super::*;

    fn sample_gateway(url: String, enabled: bool) -> Gateway {
        let now = Utc::now();
        Gateway {
            id: GatewayId::new(),
            name: "g1".into(),
            url,
            description: String::new(),
            capabilities: Default::default(),
            auth_type: AuthType::None,
            auth_value: AuthValue::empty(),
            status: if enabled { EntityStatus::active() } else { EntityStatus::inactive() },
            last_seen: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn make_forwarder() -> (Forwarder, Arc<MemoryGatewayRepository>) {
        let repository = Arc::new(MemoryGatewayRepository::default());
        let forwarder = Forwarder::new(reqwest::Client::new(), "svc".into(), "secret".into(), repository.clone());
        (forwarder, repository)
    }

    #[tokio::test]
    async fn forward_rejects_disabled_gateway_without_any_http_call() {
        let (forwarder, _repository) = make_forwarder();
        let gateway = sample_gateway("https://unreachable.invalid".into(), false);

        let err = forwarder.forward(&gateway, "tools/call", None).await.unwrap_err();
        assert!(matches!(err, FederationError::ForwardingRejected(_)));
    }

    #[tokio::test]
    async fn forward_returns_result_on_success() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/rpc")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":{"ok":true}}"#)
            .create_async()
            .await;

        let (forwarder, repository) = make_forwarder();
        let gateway = sample_gateway(server.url(), true);
        let stored = repository.insert_gateway(gateway.clone(), vec![]).await.unwrap();

        let result = forwarder.forward(&stored, "tools/call", None).await.unwrap();
        assert_eq!(result["ok"], true);

        // §4.7 step 6: last_seen is refreshed in the repository on success.
        let refreshed = repository.get_gateway(stored.id).await.unwrap().unwrap();
        assert!(refreshed.last_seen.is_some());
    }

    #[tokio::test]
    async fn forward_surfaces_json_rpc_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/rpc")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"method not found"}}"#)
            .create_async()
            .await;

        let (forwarder, _repository) = make_forwarder();
        let gateway = sample_gateway(server.url(), true);

        let err = forwarder.forward(&gateway, "bogus", None).await.unwrap_err();
        assert!(matches!(err, FederationError::UpstreamError(msg) if msg == "method not found"));
    }
}
