//! Audit trail entries and structural change records.

pub mod change;
pub mod model;

pub use change::{ChangeType, FieldChange, FieldType};
pub use model::{AuditAction, AuditEntry, CreateAuditEntry};
