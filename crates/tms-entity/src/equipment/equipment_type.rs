//! Equipment type record.

use std::fmt;

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

/// What kind of equipment an equipment type describes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "equipment_class", rename_all = "PascalCase")]
pub enum EquipmentClass {
    #[default]
    Tractor,
    Trailer,
    Container,
    Other,
}

impl fmt::Display for EquipmentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Tractor => "Tractor",
            Self::Trailer => "Trailer",
            Self::Container => "Container",
            Self::Other => "Other",
        };
        f.write_str(s)
    }
}

/// A tenant-defined category of equipment ("Day Cab", "53' Reefer").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentType {
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
    pub description: Option<String>,
    pub class: EquipmentClass,
    #[serde(default)]
    #[validate(length(equal = 7, message = "Color must be a hex value such as #1F2937"))]
    pub color: Option<String>,
}

impl EquipmentType {
    pub fn new(code: impl Into<String>, class: EquipmentClass) -> Self {
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
            description: None,
            class,
            color: None,
        }
    }
}

impl DomainRecord for EquipmentType {
    const RESOURCE: Resource = Resource::EquipmentType;
    const TABLE: &'static str = "equipment_types";
    const MODEL_NAME: &'static str = "equipment type";
    const PRIMARY_FIELD: &'static str = "code";
    const UNIQUE_FIELDS: &'static [UniqueField] = &[UniqueField::new(
        "code",
        "code",
        "Equipment type with code :value already exists",
    )];
    const SEARCH_FIELDS: &'static [&'static str] = &["code", "description"];

    record_accessors!();

    fn validate(&self, _ctx: &ValidationContext, errors: &mut MultiError) {
        checks::require_text(&self.code, "code", "Code is required", errors);
        checks::collect_violations(Validate::validate(self), errors);
    }

    fn select_option(&self) -> SelectOption {
        SelectOption {
            value: self.id.map(|id| id.to_string()).unwrap_or_default(),
            label: self.code.clone(),
            color: self.color.clone(),
        }
    }
}
