use serde::{Deserialize, Serialize};

/// Structured activation/liveness record.
///
/// Replaces a prior single `is_active` boolean (see the migration notes in
/// `DESIGN.md`). `enabled` reflects an admin decision (register/toggle);
/// `reachable` reflects the most recent health-probe outcome. Only `enabled`
/// currently drives registry decisions — `reachable` is carried so a future
/// health signal can be recorded without another schema migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityStatus {
    pub enabled: bool,
    pub reachable: bool,
}

impl EntityStatus {
    /// A freshly registered, reachable entity.
    #[must_use]
    pub fn active() -> Self {
        Self {
            enabled: true,
            reachable: true,
        }
    }

    /// A disabled entity. `reachable` is left at its last known value by
    /// callers; this constructor defaults it to `false` for the case where
    /// no prior probe ever succeeded.
    #[must_use]
    pub fn inactive() -> Self {
        Self {
            enabled: false,
            reachable: false,
        }
    }
}
