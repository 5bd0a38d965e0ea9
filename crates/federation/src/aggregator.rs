use fedgate_core::{CapabilityMap, Gateway};

/// Capability Aggregator (C8): the baseline capability map every federation
/// instance advertises even with zero active gateways (§4.8).
#[must_use]
pub fn baseline() -> CapabilityMap {
    serde_json::json!({
        "prompts": {"listChanged": true},
        "resources": {"subscribe": true, "listChanged": true},
        "tools": {"listChanged": true},
        "logging": {}
    })
    .as_object()
    .cloned()
    .unwrap_or_default()
}

/// Merge `gateways`' capability maps onto the baseline, in persistence
/// order. Unknown top-level keys are adopted as-is; for keys whose value is
/// itself a map, the aggregate's sub-map is updated key-by-key with
/// last-write-wins (§4.8).
#[must_use]
pub fn aggregate(gateways: &[Gateway]) -> CapabilityMap {
    let mut aggregate = baseline();
    for gateway in gateways {
        merge(&mut aggregate, &gateway.capabilities);
    }
    aggregate
}

fn merge(into: &mut CapabilityMap, from: &CapabilityMap) {
    for (key, value) in from {
        match (into.get_mut(key), value) {
            (Some(serde_json::Value::Object(existing)), serde_json::Value::Object(incoming)) => {
                for (sub_key, sub_value) in incoming {
                    existing.insert(sub_key.clone(), sub_value.clone());
                }
            }
            _ => {
                into.insert(key.clone(), value.clone());
            }
        }
    }
}
