use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::{AuthType, AuthValue};
use crate::ids::GatewayId;
use crate::status::EntityStatus;
use crate::CapabilityMap;

/// A federated upstream gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gateway {
    pub id: GatewayId,
    /// Unique across all gateways, active or inactive, case-sensitive (I1).
    pub name: String,
    /// Absolute base URL. `/rpc` is appended for forwarding.
    pub url: String,
    pub description: String,
    pub capabilities: CapabilityMap,
    pub auth_type: AuthType,
    pub auth_value: AuthValue,
    pub status: EntityStatus,
    pub last_seen: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Gateway {
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.status.enabled
    }
}

/// Input to [`register`](crate::Gateway) — fields supplied by the caller
/// before the connector has probed the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayInput {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_auth_type")]
    pub auth_type: AuthType,
    #[serde(default)]
    pub auth_value: AuthValue,
}

fn default_auth_type() -> AuthType {
    AuthType::None
}

/// Partial update to a [`Gateway`]. Fields absent from the patch (`None`)
/// are left unchanged; fields present overwrite unconditionally, including
/// with an empty string/value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayPatch {
    pub name: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub auth_type: Option<AuthType>,
    pub auth_value: Option<AuthValue>,
}

impl GatewayPatch {
    /// Whether this patch changes the URL (triggers a re-probe, §4.6 step 4).
    #[must_use]
    pub fn changes_url(&self, current: &str) -> bool {
        matches!(&self.url, Some(new_url) if new_url != current)
    }

    /// Whether this patch changes the name (triggers a uniqueness check,
    /// §4.6 step 2).
    #[must_use]
    pub fn changes_name(&self, current: &str) -> bool {
        matches!(&self.name, Some(new_name) if new_name != current)
    }
}
