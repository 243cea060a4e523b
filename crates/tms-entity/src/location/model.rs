//! Location record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tms_core::traits::{ChildCollection, DomainRecord, UniqueField};
use tms_core::types::{BusinessUnitId, OrganizationId, RecordId, Resource, SelectOption};
use tms_core::{ErrorCode, MultiError, ValidationContext};
use validator::Validate;

use crate::checks;
use crate::location::{LocationComment, LocationContact};
use crate::macros::record_accessors;
use crate::status::Status;

/// A physical site where freight is picked up or delivered.
///
/// `comments` and `contacts` are owned children. They are loaded only when
/// relations are expanded and are reconciled against storage on every
/// write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Location {
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
    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[validate(length(max = 150, message = "Address line 1 must be at most 150 characters"))]
    pub address_line_1: String,
    #[serde(default)]
    #[validate(length(max = 150, message = "Address line 2 must be at most 150 characters"))]
    pub address_line_2: Option<String>,
    #[validate(length(max = 100, message = "City must be at most 100 characters"))]
    pub city: String,
    #[validate(length(equal = 2, message = "State must be a two-letter code"))]
    pub state: String,
    #[validate(length(max = 10, message = "Postal code must be at most 10 characters"))]
    pub postal_code: String,
    #[serde(default)]
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub latitude: Option<f64>,
    #[serde(default)]
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub longitude: Option<f64>,
    #[sqlx(skip)]
    #[serde(default)]
    #[validate(nested)]
    pub comments: Vec<LocationComment>,
    #[sqlx(skip)]
    #[serde(default)]
    #[validate(nested)]
    pub contacts: Vec<LocationContact>,
}

impl Location {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        address_line_1: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        postal_code: impl Into<String>,
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
            name: name.into(),
            description: None,
            address_line_1: address_line_1.into(),
            address_line_2: None,
            city: city.into(),
            state: state.into(),
            postal_code: postal_code.into(),
            latitude: None,
            longitude: None,
            comments: Vec::new(),
            contacts: Vec::new(),
        }
    }
}

impl DomainRecord for Location {
    const RESOURCE: Resource = Resource::Location;
    const TABLE: &'static str = "locations";
    const MODEL_NAME: &'static str = "location";
    const PRIMARY_FIELD: &'static str = "code";
    const UNIQUE_FIELDS: &'static [UniqueField] = &[UniqueField::new(
        "code",
        "code",
        "Location with code :value already exists",
    )];
    const SEARCH_FIELDS: &'static [&'static str] = &["code", "name", "city"];
    const CHILD_COLLECTIONS: &'static [ChildCollection] = &[
        ChildCollection {
            field: "comments",
            table: "location_comments",
            parent_field: "locationId",
        },
        ChildCollection {
            field: "contacts",
            table: "location_contacts",
            parent_field: "locationId",
        },
    ];

    record_accessors!();

    fn validate(&self, _ctx: &ValidationContext, errors: &mut MultiError) {
        checks::require_text(&self.code, "code", "Code is required", errors);
        checks::require_text(&self.name, "name", "Name is required", errors);
        checks::require_text(&self.address_line_1, "addressLine1", "Address line 1 is required", errors);
        checks::require_text(&self.city, "city", "City is required", errors);
        checks::require_text(&self.postal_code, "postalCode", "Postal code is required", errors);

        for (index, comment) in self.comments.iter().enumerate() {
            if comment.comment.trim().is_empty() {
                errors.add_at("comments", index, "comment", ErrorCode::Required, "Comment is required");
            }
        }
        for (index, contact) in self.contacts.iter().enumerate() {
            if contact.name.trim().is_empty() {
                errors.add_at("contacts", index, "name", ErrorCode::Required, "Name is required");
            }
        }

        checks::collect_violations(Validate::validate(self), errors);
    }

    fn select_option(&self) -> SelectOption {
        SelectOption {
            value: self.id.map(|id| id.to_string()).unwrap_or_default(),
            label: format!("{} - {}", self.code, self.name),
            color: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tms_core::types::{TenantContext, UserId};

    fn ctx() -> ValidationContext {
        ValidationContext::update(TenantContext::new(
            OrganizationId::new(),
            BusinessUnitId::new(),
            UserId::new(),
        ))
    }

    #[test]
    fn test_child_errors_are_indexed() {
        let mut location = Location::new("DAL01", "Dallas Yard", "1 Main St", "Dallas", "TX", "75201");
        location.contacts.push(LocationContact::new("Dock office"));
        let mut bad = LocationContact::new("");
        bad.email = Some("bad".to_string());
        location.contacts.push(bad);
        location.comments.push(LocationComment::new("  "));

        let mut errors = MultiError::new();
        DomainRecord::validate(&location, &ctx(), &mut errors);

        assert!(errors.has_field("contacts[1].name"));
        assert!(errors.has_field("contacts[1].email"));
        assert!(errors.has_field("comments[0].comment"));
        assert!(!errors.has_field("contacts[0].name"));
    }

    #[test]
    fn test_state_must_be_two_letters() {
        let location = Location::new("DAL01", "Dallas Yard", "1 Main St", "Dallas", "Texas", "75201");
        let mut errors = MultiError::new();
        DomainRecord::validate(&location, &ctx(), &mut errors);
        assert!(errors.has_field("state"));
    }
}
