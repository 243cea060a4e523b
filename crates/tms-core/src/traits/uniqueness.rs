//! Per-tenant uniqueness probing ahead of a write.

use async_trait::async_trait;
use serde_json::Value;

use crate::result::AppResult;
use crate::traits::record::{DomainRecord, UniqueField};
use crate::validation::{ErrorCode, MultiError};
use crate::types::id::RecordId;
use crate::types::tenant::Tenant;

/// Whether the checked record is new or replaces an existing row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniquenessOperation {
    Create,
    Update,
}

/// A unique field together with the value about to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueFieldValue {
    pub field: UniqueField,
    pub value: String,
}

impl UniqueFieldValue {
    /// Message reported when the value is taken.
    pub fn message(&self) -> String {
        self.field.render(&self.value)
    }
}

/// Everything a checker needs to look for conflicting rows.
#[derive(Debug, Clone)]
pub struct UniquenessSpec {
    pub table: &'static str,
    pub tenant: Tenant,
    pub model_name: &'static str,
    pub fields: Vec<UniqueFieldValue>,
    pub operation: UniquenessOperation,
    /// Row excluded from the lookup on update.
    pub primary_key: Option<RecordId>,
}

impl UniquenessSpec {
    /// Build the lookup for `record`. Fields whose value is null or empty
    /// are left out.
    pub fn for_record<R: DomainRecord>(
        record: &R,
        operation: UniquenessOperation,
    ) -> AppResult<Self> {
        let json = serde_json::to_value(record)?;
        let fields = R::UNIQUE_FIELDS
            .iter()
            .filter_map(|field| {
                scalar_text(json.get(field.field)?).map(|value| UniqueFieldValue {
                    field: *field,
                    value,
                })
            })
            .collect();

        Ok(Self {
            table: R::TABLE,
            tenant: record.tenant(),
            model_name: R::MODEL_NAME,
            fields,
            operation,
            primary_key: match operation {
                UniquenessOperation::Create => None,
                UniquenessOperation::Update => record.id(),
            },
        })
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Textual form of a JSON scalar, or `None` for null, empty strings and
/// composite values.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// One `Duplicate` field error per conflict.
pub fn duplicate_errors(conflicts: &[UniqueFieldValue]) -> MultiError {
    let mut errors = MultiError::new();
    for conflict in conflicts {
        errors.add(conflict.field.field, ErrorCode::Duplicate, conflict.message());
    }
    errors
}

/// Looks for rows of the same tenant already holding a unique value.
#[async_trait]
pub trait UniquenessChecker: Send + Sync + 'static {
    /// The fields of `spec` whose value is already taken, in declaration
    /// order.
    async fn find_conflicts(&self, spec: &UniquenessSpec) -> AppResult<Vec<UniqueFieldValue>>;
}
