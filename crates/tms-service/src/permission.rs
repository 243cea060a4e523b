//! Permission guard shared by every service.

use tracing::warn;

use tms_core::traits::PermissionService;
use tms_core::types::{Action, PermissionCheck, Resource, TenantContext};
use tms_core::{AppError, AppResult};

/// Fail with an authorization error unless the actor of `tenant` may
/// perform `action` on `resource`.
pub async fn require_permission(
    permissions: &dyn PermissionService,
    tenant: &TenantContext,
    resource: Resource,
    action: Action,
) -> AppResult<()> {
    let result = permissions
        .has_permission(PermissionCheck::new(tenant, resource, action))
        .await?;

    if result.allowed {
        return Ok(());
    }

    warn!(
        user_id = %tenant.user_id,
        %resource,
        %action,
        reason = %result.reason,
        "Permission denied"
    );
    Err(AppError::authorization(format!(
        "You do not have permission to {action} {}",
        resource.label()
    )))
}
