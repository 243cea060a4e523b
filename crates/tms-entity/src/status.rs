//! Activity status shared by most records.

use serde::{Deserialize, Serialize};

/// Whether a record can be selected for new work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "record_status", rename_all = "PascalCase")]
pub enum Status {
    #[default]
    Active,
    Inactive,
}
