//! Free-text notes attached to a location.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tms_core::types::{BusinessUnitId, OrganizationId, RecordId, UserId};
use validator::Validate;

use crate::macros::child_record;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LocationComment {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default = "OrganizationId::nil")]
    pub organization_id: OrganizationId,
    #[serde(default = "BusinessUnitId::nil")]
    pub business_unit_id: BusinessUnitId,
    #[serde(default)]
    pub location_id: Option<RecordId>,
    /// Author of the comment.
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[validate(length(max = 1000, message = "Comment must be at most 1000 characters"))]
    pub comment: String,
}

impl LocationComment {
    pub fn new(comment: impl Into<String>) -> Self {
        Self {
            id: None,
            organization_id: OrganizationId::nil(),
            business_unit_id: BusinessUnitId::nil(),
            location_id: None,
            user_id: None,
            comment: comment.into(),
        }
    }
}

child_record!(LocationComment, location_id);
