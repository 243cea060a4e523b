//! Permission vocabulary: the resources a tenant owns and the actions a
//! user may perform on them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::types::id::{BusinessUnitId, OrganizationId, UserId};
use crate::types::tenant::TenantContext;

/// A kind of tenant-owned record guarded by permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Commodity,
    HazardousMaterial,
    EquipmentType,
    EquipmentManufacturer,
    Tractor,
    Trailer,
    Worker,
    FleetCode,
    Location,
    Customer,
    ShipmentControl,
    BillingControl,
    DispatchControl,
    AuditEntry,
}

impl Resource {
    /// Stable identifier used in storage and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Commodity => "commodity",
            Self::HazardousMaterial => "hazardous_material",
            Self::EquipmentType => "equipment_type",
            Self::EquipmentManufacturer => "equipment_manufacturer",
            Self::Tractor => "tractor",
            Self::Trailer => "trailer",
            Self::Worker => "worker",
            Self::FleetCode => "fleet_code",
            Self::Location => "location",
            Self::Customer => "customer",
            Self::ShipmentControl => "shipment_control",
            Self::BillingControl => "billing_control",
            Self::DispatchControl => "dispatch_control",
            Self::AuditEntry => "audit_entry",
        }
    }

    /// Plural noun used in user-facing messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Commodity => "commodities",
            Self::HazardousMaterial => "hazardous materials",
            Self::EquipmentType => "equipment types",
            Self::EquipmentManufacturer => "equipment manufacturers",
            Self::Tractor => "tractors",
            Self::Trailer => "trailers",
            Self::Worker => "workers",
            Self::FleetCode => "fleet codes",
            Self::Location => "locations",
            Self::Customer => "customers",
            Self::ShipmentControl => "shipment controls",
            Self::BillingControl => "billing controls",
            Self::DispatchControl => "dispatch controls",
            Self::AuditEntry => "audit entries",
        }
    }

    /// All resources.
    pub fn all() -> &'static [Resource] {
        &[
            Self::Commodity,
            Self::HazardousMaterial,
            Self::EquipmentType,
            Self::EquipmentManufacturer,
            Self::Tractor,
            Self::Trailer,
            Self::Worker,
            Self::FleetCode,
            Self::Location,
            Self::Customer,
            Self::ShipmentControl,
            Self::BillingControl,
            Self::DispatchControl,
            Self::AuditEntry,
        ]
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resource {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| AppError::validation(format!("Unknown resource: '{s}'")))
    }
}

impl TryFrom<String> for Resource {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// An operation on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Read,
    Create,
    Update,
    /// Implies every other action on the resource.
    Manage,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Create => "create",
            Self::Update => "update",
            Self::Manage => "manage",
        }
    }

    /// Whether holding `self` is enough to perform `requested`.
    pub fn covers(&self, requested: Action) -> bool {
        *self == Action::Manage || *self == requested
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Self::Read),
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "manage" => Ok(Self::Manage),
            _ => Err(AppError::validation(format!("Unknown action: '{s}'"))),
        }
    }
}

impl TryFrom<String> for Action {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One question asked of the permission service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionCheck {
    pub user_id: UserId,
    pub resource: Resource,
    pub action: Action,
    pub organization_id: OrganizationId,
    pub business_unit_id: BusinessUnitId,
}

impl PermissionCheck {
    /// Check `action` on `resource` for the actor and tenant of `tenant`.
    pub fn new(tenant: &TenantContext, resource: Resource, action: Action) -> Self {
        Self {
            user_id: tenant.user_id,
            resource,
            action,
            organization_id: tenant.organization_id,
            business_unit_id: tenant.business_unit_id,
        }
    }
}

/// Answer of the permission service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionResult {
    pub allowed: bool,
    pub reason: String,
}

impl PermissionResult {
    pub fn allow(reason: impl Into<String>) -> Self {
        Self {
            allowed: true,
            reason: reason.into(),
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_from_str() {
        for resource in Resource::all() {
            let parsed: Resource = resource.as_str().parse().expect("known resource");
            assert_eq!(parsed, *resource);
        }
        assert!("spaceship".parse::<Resource>().is_err());
    }

    #[test]
    fn test_manage_covers_everything() {
        assert!(Action::Manage.covers(Action::Update));
        assert!(Action::Read.covers(Action::Read));
        assert!(!Action::Read.covers(Action::Update));
    }
}
