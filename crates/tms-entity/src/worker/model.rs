//! Worker record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tms_core::traits::{DomainRecord, UniqueField};
use tms_core::types::{BusinessUnitId, OrganizationId, RecordId, Resource, SelectOption};
use tms_core::{MultiError, ValidationContext};
use validator::Validate;

use crate::checks;
use crate::macros::record_accessors;
use crate::status::Status;

/// Employment relationship of a worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "worker_type", rename_all = "PascalCase")]
pub enum WorkerType {
    #[default]
    Employee,
    Contractor,
}

/// A driver or other person who can be assigned to equipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Worker {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default = "OrganizationId::nil")]
    pub organization_id: OrganizationId,
    #[serde(default = "BusinessUnitId::nil")]
    pub business_unit_id: BusinessUnitId,
    #[serde(default)]
    pub version: i64,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub status: Status,
    #[validate(length(max = 10, message = "Code must be at most 10 characters"))]
    pub code: String,
    #[serde(default)]
    pub worker_type: WorkerType,
    #[validate(length(max = 100, message = "First name must be at most 100 characters"))]
    pub first_name: String,
    #[validate(length(max = 100, message = "Last name must be at most 100 characters"))]
    pub last_name: String,
    #[serde(default)]
    #[validate(email(message = "Email must be a valid email address"))]
    pub email: Option<String>,
    #[serde(default)]
    #[validate(length(max = 20, message = "Phone number must be at most 20 characters"))]
    pub phone_number: Option<String>,
}

impl Worker {
    pub fn new(
        code: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            organization_id: OrganizationId::nil(),
            business_unit_id: BusinessUnitId::nil(),
            version: 0,
            created_at: now,
            updated_at: now,
            status: Status::Active,
            code: code.into(),
            worker_type: WorkerType::Employee,
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: None,
            phone_number: None,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl DomainRecord for Worker {
    const RESOURCE: Resource = Resource::Worker;
    const TABLE: &'static str = "workers";
    const MODEL_NAME: &'static str = "worker";
    const PRIMARY_FIELD: &'static str = "code";
    const UNIQUE_FIELDS: &'static [UniqueField] = &[UniqueField::new(
        "code",
        "code",
        "Worker with code :value already exists",
    )];
    const SEARCH_FIELDS: &'static [&'static str] = &["code", "firstName", "lastName"];

    record_accessors!();

    fn validate(&self, _ctx: &ValidationContext, errors: &mut MultiError) {
        checks::require_text(&self.code, "code", "Code is required", errors);
        checks::require_text(&self.first_name, "firstName", "First name is required", errors);
        checks::require_text(&self.last_name, "lastName", "Last name is required", errors);
        checks::collect_violations(Validate::validate(self), errors);
    }

    fn select_option(&self) -> SelectOption {
        SelectOption {
            value: self.id.map(|id| id.to_string()).unwrap_or_default(),
            label: self.full_name(),
            color: None,
        }
    }
}
