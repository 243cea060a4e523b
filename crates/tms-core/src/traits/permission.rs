//! Authorization seam consulted before every service operation.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::permission::{PermissionCheck, PermissionResult};

/// Answers whether a user may perform an action on a resource in a tenant.
#[async_trait]
pub trait PermissionService: Send + Sync + 'static {
    /// Allowed when at least one of `checks` is allowed. Evaluation stops
    /// at the first allow. An empty slice is denied.
    async fn has_any_permissions(&self, checks: &[PermissionCheck]) -> AppResult<PermissionResult>;

    /// Single-check convenience.
    async fn has_permission(&self, check: PermissionCheck) -> AppResult<PermissionResult> {
        self.has_any_permissions(std::slice::from_ref(&check)).await
    }
}
