//! Equipment classification and status.

pub mod equipment_type;
pub mod status;

pub use equipment_type::{EquipmentClass, EquipmentType};
pub use status::EquipmentStatus;
