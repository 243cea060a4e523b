//! People to reach at a location.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tms_core::types::{BusinessUnitId, OrganizationId, RecordId};
use validator::Validate;

use crate::macros::child_record;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LocationContact {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default = "OrganizationId::nil")]
    pub organization_id: OrganizationId,
    #[serde(default = "BusinessUnitId::nil")]
    pub business_unit_id: BusinessUnitId,
    #[serde(default)]
    pub location_id: Option<RecordId>,
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "Email must be a valid email address"))]
    pub email: Option<String>,
    #[serde(default)]
    #[validate(length(max = 20, message = "Phone number must be at most 20 characters"))]
    pub phone_number: Option<String>,
}

impl LocationContact {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            organization_id: OrganizationId::nil(),
            business_unit_id: BusinessUnitId::nil(),
            location_id: None,
            name: name.into(),
            email: None,
            phone_number: None,
        }
    }
}

child_record!(LocationContact, location_id);
