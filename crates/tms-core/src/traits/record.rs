//! Capability set a domain record exposes to the service framework.

use std::fmt::Debug;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::types::id::RecordId;
use crate::types::pagination::SelectOption;
use crate::types::permission::Resource;
use crate::types::tenant::Tenant;
use crate::validation::{MultiError, ValidationContext};

/// JSON key of the record identifier.
pub const ID_FIELD: &str = "id";
/// JSON key of the owning organization.
pub const ORGANIZATION_FIELD: &str = "organizationId";
/// JSON key of the owning business unit.
pub const BUSINESS_UNIT_FIELD: &str = "businessUnitId";
/// JSON key of the optimistic-concurrency version.
pub const VERSION_FIELD: &str = "version";
/// JSON key of the creation timestamp.
pub const CREATED_AT_FIELD: &str = "createdAt";
/// JSON key of the last-update timestamp.
pub const UPDATED_AT_FIELD: &str = "updatedAt";

/// A field that must be unique within a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniqueField {
    /// JSON name of the field.
    pub field: &'static str,
    /// Storage column backing the field.
    pub column: &'static str,
    /// Message template. `:value` and `:field` are substituted.
    pub message: &'static str,
    pub case_sensitive: bool,
}

impl UniqueField {
    /// Case-insensitive unique field.
    pub const fn new(field: &'static str, column: &'static str, message: &'static str) -> Self {
        Self {
            field,
            column,
            message,
            case_sensitive: false,
        }
    }

    /// Name of the unique index backing this field on `table`.
    pub fn constraint_name(&self, table: &str) -> String {
        format!("uq_{table}_{}", self.column)
    }

    /// Render the message template for `value`.
    pub fn render(&self, value: &str) -> String {
        self.message
            .replace(":value", value)
            .replace(":field", self.field)
    }
}

/// A collection of child records owned by a parent record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildCollection {
    /// JSON name of the array on the parent.
    pub field: &'static str,
    /// Table the children are stored in.
    pub table: &'static str,
    /// JSON name of the back-reference to the parent on each child.
    pub parent_field: &'static str,
}

/// A persisted, tenant-scoped, versioned domain record.
pub trait DomainRecord:
    Clone + Debug + Serialize + DeserializeOwned + Send + Sync + Unpin + 'static
{
    /// Permission resource guarding this record.
    const RESOURCE: Resource;
    /// Storage table name.
    const TABLE: &'static str;
    /// Singular noun for messages ("tractor").
    const MODEL_NAME: &'static str;
    /// Field that receives version-conflict messages.
    const PRIMARY_FIELD: &'static str;
    /// Fields that must be unique per tenant.
    const UNIQUE_FIELDS: &'static [UniqueField] = &[];
    /// Fields matched by the free-text list query.
    const SEARCH_FIELDS: &'static [&'static str] = &[];
    /// Child collections reconciled on every write.
    const CHILD_COLLECTIONS: &'static [ChildCollection] = &[];

    fn id(&self) -> Option<RecordId>;
    fn set_id(&mut self, id: RecordId);

    fn tenant(&self) -> Tenant;
    fn set_tenant(&mut self, tenant: Tenant);

    fn version(&self) -> i64;
    fn set_version(&mut self, version: i64);

    fn created_at(&self) -> DateTime<Utc>;
    fn updated_at(&self) -> DateTime<Utc>;
    fn set_timestamps(&mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>);

    /// Field-level self-check. Appends to `errors`; never fails.
    fn validate(&self, ctx: &ValidationContext, errors: &mut MultiError);

    /// Picker projection.
    fn select_option(&self) -> SelectOption;
}

/// A record owned by a parent record and written inside the parent's
/// transaction.
pub trait ChildRecord:
    Clone + Debug + Serialize + DeserializeOwned + Send + Sync + Unpin + 'static
{
    fn id(&self) -> Option<RecordId>;
    fn set_id(&mut self, id: RecordId);

    /// Point the child at its parent and give it the parent's tenant.
    fn attach(&mut self, parent_id: RecordId, tenant: Tenant);
}

/// Timestamp for a write following one made at `previous`.
///
/// Guaranteed to be strictly greater than `previous` even when the clock
/// has not advanced at storage precision.
pub fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = truncate_micros(Utc::now());
    let floor = truncate_micros(previous) + Duration::microseconds(1);
    if now < floor { floor } else { now }
}

/// Drop sub-microsecond precision, matching PostgreSQL `timestamptz`.
pub fn truncate_micros(ts: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(ts.timestamp_micros()).unwrap_or(ts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_placeholders() {
        let field = UniqueField::new("code", "code", "Tractor with code :value already exists");
        assert_eq!(field.render("TRK-1"), "Tractor with code TRK-1 already exists");

        let field = UniqueField::new("name", "name", ":field ':value' is taken");
        assert_eq!(field.render("Steel"), "name 'Steel' is taken");
    }

    #[test]
    fn test_constraint_name() {
        let field = UniqueField::new("code", "code", "");
        assert_eq!(field.constraint_name("tractors"), "uq_tractors_code");
    }

    #[test]
    fn test_next_timestamp_strictly_increases() {
        let future = Utc::now() + Duration::seconds(30);
        let next = next_timestamp(future);
        assert!(next > future);

        let past = Utc::now() - Duration::seconds(30);
        assert!(next_timestamp(past) > past);
    }
}
