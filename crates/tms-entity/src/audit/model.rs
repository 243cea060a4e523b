//! Audit entry entity model.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use tms_core::AppError;
use tms_core::types::{AuditEntryId, BusinessUnitId, OrganizationId, Resource, UserId};

use super::change::FieldChange;

/// What a user did to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Create,
    Update,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            _ => Err(AppError::validation(format!("Invalid audit action: '{s}'"))),
        }
    }
}

impl TryFrom<String> for AuditAction {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// An immutable, tenant-scoped record of a user action.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: AuditEntryId,
    #[sqlx(try_from = "String")]
    pub resource: Resource,
    /// Identifier of the affected record.
    pub resource_id: String,
    #[sqlx(try_from = "String")]
    pub action: AuditAction,
    pub user_id: UserId,
    pub organization_id: OrganizationId,
    pub business_unit_id: BusinessUnitId,
    pub previous_state: Option<Value>,
    pub current_state: Option<Value>,
    /// Structural diff keyed by dotted path.
    #[sqlx(json)]
    pub changes: BTreeMap<String, FieldChange>,
    pub comment: Option<String>,
    pub category: String,
    pub metadata: Value,
    /// Entries flagged critical are never sampled or dropped by sinks.
    pub critical: bool,
    pub timestamp: DateTime<Utc>,
}

/// Data required to append an audit entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAuditEntry {
    pub resource: Resource,
    pub resource_id: String,
    pub action: AuditAction,
    pub user_id: UserId,
    pub organization_id: OrganizationId,
    pub business_unit_id: BusinessUnitId,
    pub previous_state: Option<Value>,
    pub current_state: Option<Value>,
    pub changes: BTreeMap<String, FieldChange>,
    pub comment: Option<String>,
    pub category: String,
    pub metadata: Value,
    pub critical: bool,
    pub timestamp: DateTime<Utc>,
}

impl CreateAuditEntry {
    /// Materialize the entry under a fresh id.
    pub fn into_entry(self) -> AuditEntry {
        AuditEntry {
            id: AuditEntryId::new(),
            resource: self.resource,
            resource_id: self.resource_id,
            action: self.action,
            user_id: self.user_id,
            organization_id: self.organization_id,
            business_unit_id: self.business_unit_id,
            previous_state: self.previous_state,
            current_state: self.current_state,
            changes: self.changes,
            comment: self.comment,
            category: self.category,
            metadata: self.metadata,
            critical: self.critical,
            timestamp: self.timestamp,
        }
    }
}
