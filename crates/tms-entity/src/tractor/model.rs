//! Tractor record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tms_core::traits::{DomainRecord, UniqueField};
use tms_core::types::{BusinessUnitId, OrganizationId, RecordId, Resource, SelectOption};
use tms_core::{MultiError, ValidationContext};
use validator::Validate;

use crate::checks;
use crate::equipment::EquipmentStatus;
use crate::macros::record_accessors;

/// A tractor, its equipment type and the workers assigned to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Tractor {
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
    pub status: EquipmentStatus,
    #[validate(length(max = 50, message = "Code must be at most 50 characters"))]
    pub code: String,
    #[serde(default)]
    pub equipment_type_id: Option<RecordId>,
    #[serde(default)]
    pub primary_worker_id: Option<RecordId>,
    #[serde(default)]
    pub secondary_worker_id: Option<RecordId>,
    #[serde(default)]
    #[validate(length(equal = 17, message = "VIN must be exactly 17 characters"))]
    pub vin: Option<String>,
    #[serde(default)]
    #[validate(length(max = 50, message = "Model must be at most 50 characters"))]
    pub model: Option<String>,
    #[serde(default)]
    #[validate(range(min = 1900, max = 2100, message = "Year must be between 1900 and 2100"))]
    pub year: Option<i32>,
    #[serde(default)]
    #[validate(length(max = 50, message = "License plate number must be at most 50 characters"))]
    pub license_plate_number: Option<String>,
}

/// Workers currently assigned to a tractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TractorAssignment {
    pub primary_worker_id: Option<RecordId>,
    pub secondary_worker_id: Option<RecordId>,
}

impl Tractor {
    pub fn new(code: impl Into<String>, equipment_type_id: RecordId) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            organization_id: OrganizationId::nil(),
            business_unit_id: BusinessUnitId::nil(),
            version: 0,
            created_at: now,
            updated_at: now,
            status: EquipmentStatus::Available,
            code: code.into(),
            equipment_type_id: Some(equipment_type_id),
            primary_worker_id: None,
            secondary_worker_id: None,
            vin: None,
            model: None,
            year: None,
            license_plate_number: None,
        }
    }

    pub fn assignment(&self) -> TractorAssignment {
        TractorAssignment {
            primary_worker_id: self.primary_worker_id,
            secondary_worker_id: self.secondary_worker_id,
        }
    }
}

impl DomainRecord for Tractor {
    const RESOURCE: Resource = Resource::Tractor;
    const TABLE: &'static str = "tractors";
    const MODEL_NAME: &'static str = "tractor";
    const PRIMARY_FIELD: &'static str = "code";
    const UNIQUE_FIELDS: &'static [UniqueField] = &[UniqueField::new(
        "code",
        "code",
        "Tractor with code :value already exists",
    )];
    const SEARCH_FIELDS: &'static [&'static str] = &["code", "vin"];

    record_accessors!();

    fn validate(&self, _ctx: &ValidationContext, errors: &mut MultiError) {
        checks::require_text(&self.code, "code", "Code is required", errors);
        checks::require_some(
            &self.equipment_type_id,
            "equipmentTypeId",
            "Equipment type is required",
            errors,
        );
        checks::collect_violations(Validate::validate(self), errors);
    }

    fn select_option(&self) -> SelectOption {
        SelectOption {
            value: self.id.map(|id| id.to_string()).unwrap_or_default(),
            label: self.code.clone(),
            color: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tms_core::types::{TenantContext, UserId};

    #[test]
    fn test_year_and_vin_constraints() {
        let mut tractor = Tractor::new("TRK-1", RecordId::new());
        tractor.year = Some(1850);
        tractor.vin = Some("SHORT".to_string());

        let ctx = ValidationContext::create(TenantContext::new(
            OrganizationId::new(),
            BusinessUnitId::new(),
            UserId::new(),
        ));
        let mut errors = MultiError::new();
        DomainRecord::validate(&tractor, &ctx, &mut errors);

        assert!(errors.has_field("year"));
        assert!(errors.has_field("vin"));
        assert!(!errors.has_field("code"));
    }
}
