use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque stable identifier for a [`Gateway`](crate::Gateway).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GatewayId(pub Uuid);

impl GatewayId {
    /// Generate a new random id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GatewayId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GatewayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Opaque stable identifier for a [`Tool`](crate::Tool).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolId(pub Uuid);

impl ToolId {
    /// Generate a new random id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ToolId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        assert_ne!(GatewayId::new(), GatewayId::new());
        assert_ne!(ToolId::new(), ToolId::new());
    }

    #[test]
    fn gateway_id_roundtrips_through_json() {
        let id = GatewayId::new();
        let json = serde_json::to_string(&id).unwrap();
        let back: GatewayId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
