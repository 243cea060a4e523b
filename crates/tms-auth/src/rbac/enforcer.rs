//! Permission checks answered from tenant roles and stored grants.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use tms_core::AppResult;
use tms_core::traits::PermissionService;
use tms_core::types::{PermissionCheck, PermissionResult, Tenant, UserId};
use tms_database::PermissionGrantStore;
use tms_entity::permission::PermissionManifest;

use super::policies::RolePolicies;

/// Default [`PermissionService`]: deny unless the user's role or one of
/// their grants in the check's tenant covers the requested action.
#[derive(Clone)]
pub struct PolicyPermissionService {
    store: Arc<dyn PermissionGrantStore>,
    policies: RolePolicies,
}

impl PolicyPermissionService {
    /// Creates a service with the default role policies.
    pub fn new(store: Arc<dyn PermissionGrantStore>) -> Self {
        Self {
            store,
            policies: RolePolicies::new(),
        }
    }

    /// Creates a service with custom role policies.
    pub fn with_policies(store: Arc<dyn PermissionGrantStore>, policies: RolePolicies) -> Self {
        Self { store, policies }
    }

    /// Evaluate one check against a loaded manifest.
    pub fn evaluate(&self, manifest: &PermissionManifest, check: &PermissionCheck) -> PermissionResult {
        if manifest.role.is_admin() {
            return PermissionResult::allow("user has admin role");
        }
        if self
            .policies
            .has_permission(manifest.role, check.resource, check.action)
        {
            return PermissionResult::allow(format!("{} role allows it", manifest.role));
        }
        if manifest.grants(check.resource, check.action) {
            return PermissionResult::allow(format!(
                "granted {} on {}",
                check.action, check.resource
            ));
        }
        PermissionResult::deny(format!(
            "user lacks {} on {}",
            check.action, check.resource
        ))
    }
}

impl std::fmt::Debug for PolicyPermissionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyPermissionService")
            .field("policies", &self.policies)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl PermissionService for PolicyPermissionService {
    async fn has_any_permissions(&self, checks: &[PermissionCheck]) -> AppResult<PermissionResult> {
        if checks.is_empty() {
            return Ok(PermissionResult::deny("no permission checks supplied"));
        }

        let mut manifests: HashMap<(UserId, Tenant), PermissionManifest> = HashMap::new();
        let mut last_denial = None;

        for check in checks {
            let key = (
                check.user_id,
                Tenant::new(check.organization_id, check.business_unit_id),
            );
            if !manifests.contains_key(&key) {
                let manifest = self.store.manifest(key.0, key.1).await?;
                manifests.insert(key, manifest);
            }
            let Some(manifest) = manifests.get(&key) else {
                continue;
            };

            let result = self.evaluate(manifest, check);
            if result.allowed {
                debug!(
                    user_id = %check.user_id,
                    resource = %check.resource,
                    action = %check.action,
                    reason = %result.reason,
                    "Permission granted"
                );
                return Ok(result);
            }
            last_denial = Some(result);
        }

        let denial = last_denial.unwrap_or_else(|| PermissionResult::deny("permission denied"));
        if let Some(check) = checks.first() {
            debug!(
                user_id = %check.user_id,
                organization_id = %check.organization_id,
                resource = %check.resource,
                action = %check.action,
                reason = %denial.reason,
                "Permission denied"
            );
        }
        Ok(denial)
    }
}
