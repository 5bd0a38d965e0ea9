use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::auth::{AuthType, AuthValue};
use crate::ids::{GatewayId, ToolId};
use crate::status::EntityStatus;

/// How a tool's underlying call is shaped on the wire. Opaque beyond the
/// tag itself -- this service never issues the call, only records how the
/// owning gateway described it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationType {
    Rest,
    Mcp,
    A2a,
}

/// A tool exposed by a federated gateway, as learned via a probe (C2).
///
/// `name` is unique across the entire fleet, not just within the owning
/// gateway (§3, register step 3 and P7): two gateways cannot both own a
/// tool of the same name, so `gateway_id` names the one gateway this
/// descriptor was attached to at discovery time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    pub id: ToolId,
    pub gateway_id: GatewayId,
    pub name: String,
    /// Copy of the owning gateway's URL at attachment time.
    pub url: String,
    pub description: String,
    pub integration_type: IntegrationType,
    /// Request shape understood by the gateway, e.g. `"GET"`, `"POST"`,
    /// `"SSE"`. Opaque beyond being forwarded verbatim.
    pub request_type: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    pub input_schema: serde_json::Value,
    /// Optional JSONPath expression applied to a tool's response before it
    /// is handed back to the caller. `None` means the response passes
    /// through unfiltered.
    #[serde(default)]
    pub jsonpath_filter: Option<String>,
    /// Copied from the owning gateway's auth at discovery time (§3).
    pub auth_type: AuthType,
    pub auth_value: AuthValue,
    pub status: EntityStatus,
}

/// What a probe (C2) returns for a single tool, before it has been assigned
/// a [`ToolId`] or attached to a gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_integration_type")]
    pub integration_type: IntegrationType,
    #[serde(default = "default_request_type")]
    pub request_type: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default = "default_schema")]
    pub input_schema: serde_json::Value,
    #[serde(default)]
    pub jsonpath_filter: Option<String>,
}

fn default_integration_type() -> IntegrationType {
    IntegrationType::Mcp
}

fn default_request_type() -> String {
    "POST".to_owned()
}

fn default_schema() -> serde_json::Value {
    serde_json::json!({})
}

impl ToolDescriptor {
    /// Materialize a full [`Tool`] attached to `gateway_id`, copying the
    /// owning gateway's URL and auth material (§3, register step 3).
    #[must_use]
    pub fn into_tool(
        self,
        gateway_id: GatewayId,
        gateway_url: &str,
        auth_type: AuthType,
        auth_value: AuthValue,
    ) -> Tool {
        Tool {
            id: ToolId::new(),
            gateway_id,
            name: self.name,
            url: gateway_url.to_owned(),
            description: self.description,
            integration_type: self.integration_type,
            request_type: self.request_type,
            headers: self.headers,
            input_schema: self.input_schema,
            jsonpath_filter: self.jsonpath_filter,
            auth_type,
            auth_value,
            status: EntityStatus::active(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_into_tool_copies_gateway_url_and_auth() {
        let gateway_id = GatewayId::new();
        let descriptor = ToolDescriptor {
            name: "search".into(),
            description: "full text search".into(),
            integration_type: IntegrationType::Rest,
            request_type: "GET".into(),
            headers: HashMap::new(),
            input_schema: serde_json::json!({"type": "object"}),
            jsonpath_filter: Some("$.items".into()),
        };

        let tool = descriptor.into_tool(
            gateway_id,
            "https://g1.example/",
            AuthType::Bearer,
            AuthValue::empty(),
        );

        assert_eq!(tool.gateway_id, gateway_id);
        assert_eq!(tool.url, "https://g1.example/");
        assert_eq!(tool.auth_type, AuthType::Bearer);
        assert!(tool.status.enabled);
    }
}
