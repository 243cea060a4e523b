//! One field-level difference between two states of a record.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a field changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Created,
    Updated,
    Deleted,
}

/// JSON shape of a changed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Array,
    Object,
    #[serde(rename = "datetime")]
    DateTime,
    Null,
    Undefined,
}

/// A single entry of a structural diff, keyed by its dotted path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    pub from: Value,
    pub to: Value,
    pub change_type: ChangeType,
    pub field_type: FieldType,
    pub path: String,
}
