//! Permission grant entity model.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tms_core::AppError;
use tms_core::types::{Action, BusinessUnitId, GrantId, OrganizationId, Resource, Tenant, UserId};

/// Role of a user inside one tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantRole {
    /// Every action on every resource of the tenant.
    Admin,
    /// Only what explicit grants allow.
    Member,
}

impl TenantRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for TenantRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TenantRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            _ => Err(AppError::validation(format!(
                "Invalid tenant role: '{s}'. Expected one of: admin, member"
            ))),
        }
    }
}

/// Permission for a user to perform `action` on `resource` in a tenant.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PermissionGrant {
    pub id: GrantId,
    pub user_id: UserId,
    pub organization_id: OrganizationId,
    pub business_unit_id: BusinessUnitId,
    #[sqlx(try_from = "String")]
    pub resource: Resource,
    #[sqlx(try_from = "String")]
    pub action: Action,
    pub created_at: DateTime<Utc>,
}

/// Everything a user may do inside one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionManifest {
    pub user_id: UserId,
    pub tenant: Tenant,
    pub role: TenantRole,
    pub grants: HashSet<(Resource, Action)>,
}

impl PermissionManifest {
    /// Manifest of a user holding nothing in `tenant`.
    pub fn empty(user_id: UserId, tenant: Tenant) -> Self {
        Self {
            user_id,
            tenant,
            role: TenantRole::Member,
            grants: HashSet::new(),
        }
    }

    /// Whether an explicit grant covers `action` on `resource`.
    pub fn grants(&self, resource: Resource, action: Action) -> bool {
        self.grants
            .iter()
            .any(|(r, a)| *r == resource && a.covers(action))
    }
}
