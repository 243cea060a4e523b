//! Equipment availability.

use serde::{Deserialize, Serialize};

/// Operational status of a piece of equipment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "equipment_status", rename_all = "PascalCase")]
pub enum EquipmentStatus {
    #[default]
    Available,
    OutOfService,
    AtMaintenance,
    Sold,
}

impl EquipmentStatus {
    /// Whether the equipment can be dispatched.
    pub fn is_dispatchable(&self) -> bool {
        matches!(self, Self::Available)
    }
}
