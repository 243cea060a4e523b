//! Commodity record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tms_core::traits::{DomainRecord, UniqueField};
use tms_core::types::{BusinessUnitId, OrganizationId, RecordId, Resource, SelectOption};
use tms_core::{ErrorCode, MultiError, ValidationContext};
use validator::Validate;

use crate::checks;
use crate::macros::record_accessors;
use crate::status::Status;

/// A kind of freight, optionally temperature-controlled or hazardous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Commodity {
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
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub min_temperature: Option<i32>,
    #[serde(default)]
    pub max_temperature: Option<i32>,
    #[serde(default)]
    #[validate(length(max = 20, message = "Unit of measure must be at most 20 characters"))]
    pub unit_of_measure: Option<String>,
    #[serde(default)]
    pub hazardous_material_id: Option<RecordId>,
    #[serde(default)]
    pub stackable: bool,
    #[serde(default)]
    pub fragile: bool,
}

impl Commodity {
    /// A new, unsaved commodity.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            organization_id: OrganizationId::nil(),
            business_unit_id: BusinessUnitId::nil(),
            version: 0,
            created_at: now,
            updated_at: now,
            status: Status::Active,
            name: name.into(),
            description: None,
            min_temperature: None,
            max_temperature: None,
            unit_of_measure: None,
            hazardous_material_id: None,
            stackable: false,
            fragile: false,
        }
    }
}

impl DomainRecord for Commodity {
    const RESOURCE: Resource = Resource::Commodity;
    const TABLE: &'static str = "commodities";
    const MODEL_NAME: &'static str = "commodity";
    const PRIMARY_FIELD: &'static str = "name";
    const UNIQUE_FIELDS: &'static [UniqueField] = &[UniqueField::new(
        "name",
        "name",
        "Commodity with name :value already exists",
    )];
    const SEARCH_FIELDS: &'static [&'static str] = &["name", "description"];

    record_accessors!();

    fn validate(&self, _ctx: &ValidationContext, errors: &mut MultiError) {
        checks::require_text(&self.name, "name", "Name is required", errors);
        checks::collect_violations(Validate::validate(self), errors);

        if let (Some(min), Some(max)) = (self.min_temperature, self.max_temperature) {
            if min > max {
                errors.add(
                    "minTemperature",
                    ErrorCode::Invalid,
                    "Minimum temperature must be less than or equal to maximum temperature",
                );
            }
        }
    }

    fn select_option(&self) -> SelectOption {
        SelectOption {
            value: self.id.map(|id| id.to_string()).unwrap_or_default(),
            label: self.name.clone(),
            color: None,
        }
    }
}
