use async_trait::async_trait;
use fedgate_core::{AuthType, AuthValue, CapabilityMap, ToolDescriptor};
use reqwest::Client;
use tracing::instrument;

use crate::auth::encode;
use crate::error::ConnectorError;

/// What a probe (C2) returns: the gateway's capability map and its full
/// list of tool descriptors, before either has been persisted or attached.
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub capabilities: CapabilityMap,
    pub tools: Vec<ToolDescriptor>,
}

/// Upstream Connector (C2): a one-shot session to a gateway URL.
///
/// Implementations must release the session and its underlying transport
/// on every exit path, including error paths — `reqwest`'s connection
/// pooling handles this automatically as long as the response body is
/// dropped rather than held open, which is what every code path here does.
#[async_trait]
pub trait GatewayConnector: Send + Sync {
    async fn probe(
        &self,
        url: &str,
        auth_type: AuthType,
        auth_value: &AuthValue,
    ) -> Result<ProbeOutcome, ConnectorError>;
}

#[derive(serde::Deserialize)]
struct InitializeResponse {
    #[serde(default)]
    capabilities: CapabilityMap,
}

#[derive(serde::Deserialize)]
struct ListToolsResponse {
    #[serde(default)]
    tools: Vec<ToolDescriptor>,
}

/// [`GatewayConnector`] built on a shared `reqwest::Client`, speaking the
/// two-step `initialize` / `list_tools` handshake over a streaming session
/// (an `Accept: text/event-stream` request to the gateway's root URL),
/// mirroring the original's `sse_client` + `ClientSession.initialize()` +
/// `list_tools()` pairing.
#[derive(Debug, Clone)]
pub struct StreamingHttpConnector {
    client: Client,
}

impl StreamingHttpConnector {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn call(
        &self,
        url: &str,
        method: &str,
        headers: &[(String, String)],
    ) -> Result<reqwest::Response, ConnectorError> {
        let envelope = fedgate_core::JsonRpcRequest::new(serde_json::json!(1), method, None);

        let mut request = self
            .client
            .post(url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(&envelope);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(ConnectorError::Status(response.status()));
        }
        Ok(response)
    }
}

#[async_trait]
impl GatewayConnector for StreamingHttpConnector {
    #[instrument(skip(self, auth_value), fields(gateway.url = %url))]
    async fn probe(
        &self,
        url: &str,
        auth_type: AuthType,
        auth_value: &AuthValue,
    ) -> Result<ProbeOutcome, ConnectorError> {
        let headers = encode(auth_type, auth_value);

        let init_response = self.call(url, "initialize", &headers).await?;
        let init_body: InitializeResponse = init_response
            .json()
            .await
            .map_err(|e| ConnectorError::Protocol(e.to_string()))?;

        let list_response = self.call(url, "tools/list", &headers).await?;
        let list_body: ListToolsResponse = list_response
            .json()
            .await
            .map_err(|e| ConnectorError::Protocol(e.to_string()))?;

        Ok(ProbeOutcome {
            capabilities: init_body.capabilities,
            tools: list_body.tools,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn probe_parses_capabilities_and_tools() {
        let mut server = mockito::Server::new_async().await;

        let _init_mock = server
            .mock("POST", "/")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({"method": "initialize"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"capabilities":{"tools":{"listChanged":true}}}"#)
            .create_async()
            .await;

        let _list_mock = server
            .mock("POST", "/")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({"method": "tools/list"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"tools":[{"name":"search","description":"full text search","input_schema":{}}]}"#,
            )
            .create_async()
            .await;

        let connector = StreamingHttpConnector::new(Client::new());
        let outcome = connector
            .probe(&server.url(), AuthType::None, &AuthValue::empty())
            .await
            .expect("probe should succeed");

        assert_eq!(outcome.tools.len(), 1);
        assert_eq!(outcome.tools[0].name, "search");
        assert_eq!(outcome.capabilities["tools"]["listChanged"], true);
    }

    #[tokio::test]
    async fn probe_surfaces_non_success_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server.mock("POST", "/").with_status(503).create_async().await;

        let connector = StreamingHttpConnector::new(Client::new());
        let result = connector.probe(&server.url(), AuthType::None, &AuthValue::empty()).await;

        assert!(matches!(result, Err(ConnectorError::Status(_))));
    }
}
