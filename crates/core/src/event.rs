use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::GatewayId;

/// Lifecycle events published on the event bus (C1).
///
/// `GatewayRemoved` is part of the wire contract but is never emitted by
/// this service today — see `DESIGN.md` for why it stays in the enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    GatewayAdded,
    GatewayUpdated,
    GatewayActivated,
    GatewayDeactivated,
    GatewayDeleted,
    GatewayRemoved,
}

/// Projection of a gateway's public fields carried on an event. Deliberately
/// narrower than [`Gateway`](crate::Gateway) — no auth material, no
/// capability map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventData {
    pub id: GatewayId,
    pub name: String,
    pub url: String,
    pub description: String,
    pub enabled: bool,
}

/// An envelope published to every subscriber of the event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub data: EventData,
    pub timestamp: DateTime<Utc>,
}

impl LifecycleEvent {
    #[must_use]
    pub fn new(event_type: EventType, data: EventData) -> Self {
        Self {
            event_type,
            data,
            timestamp: Utc::now(),
        }
    }
}
