//! Tenant role and permission grant repository implementation.

use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::PgPool;

use tms_core::AppResult;
use tms_core::types::{Action, GrantId, Resource, Tenant, UserId};
use tms_entity::permission::{PermissionGrant, PermissionManifest, TenantRole};

use crate::error::database_error;
use crate::store::PermissionGrantStore;

/// Reads and writes `tenant_roles` and `permission_grants`.
#[derive(Debug, Clone)]
pub struct PgPermissionGrantRepository {
    pool: PgPool,
}

impl PgPermissionGrantRepository {
    /// Create a new grant repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Grant `action` on `resource` to a user in `tenant`. Granting twice
    /// is a no-op.
    pub async fn grant(
        &self,
        user_id: UserId,
        tenant: Tenant,
        resource: Resource,
        action: Action,
    ) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO permission_grants (id, user_id, organization_id, business_unit_id, resource, action) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (user_id, organization_id, business_unit_id, resource, action) DO NOTHING",
        )
        .bind(GrantId::new())
        .bind(user_id)
        .bind(tenant.organization_id)
        .bind(tenant.business_unit_id)
        .bind(resource.as_str())
        .bind(action.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| database_error("Failed to create permission grant", e))?;
        Ok(())
    }

    /// Set the role of a user in `tenant`.
    pub async fn assign_role(&self, user_id: UserId, tenant: Tenant, role: TenantRole) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO tenant_roles (user_id, organization_id, business_unit_id, role) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (user_id, organization_id, business_unit_id) DO UPDATE SET role = EXCLUDED.role",
        )
        .bind(user_id)
        .bind(tenant.organization_id)
        .bind(tenant.business_unit_id)
        .bind(role.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| database_error("Failed to assign tenant role", e))?;
        Ok(())
    }
}

#[async_trait]
impl PermissionGrantStore for PgPermissionGrantRepository {
    async fn manifest(&self, user_id: UserId, tenant: Tenant) -> AppResult<PermissionManifest> {
        let role: Option<String> = sqlx::query_scalar(
            "SELECT role FROM tenant_roles \
             WHERE user_id = $1 AND organization_id = $2 AND business_unit_id = $3",
        )
        .bind(user_id)
        .bind(tenant.organization_id)
        .bind(tenant.business_unit_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("Failed to load tenant role", e))?;

        let grants = sqlx::query_as::<_, PermissionGrant>(
            "SELECT * FROM permission_grants \
             WHERE user_id = $1 AND organization_id = $2 AND business_unit_id = $3",
        )
        .bind(user_id)
        .bind(tenant.organization_id)
        .bind(tenant.business_unit_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| database_error("Failed to load permission grants", e))?;

        let role = match role {
            Some(role) => role.parse()?,
            None => TenantRole::Member,
        };

        Ok(PermissionManifest {
            user_id,
            tenant,
            role,
            grants: grants
                .into_iter()
                .map(|g| (g.resource, g.action))
                .collect::<HashSet<_>>(),
        })
    }
}
