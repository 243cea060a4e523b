//! In-memory tenant roles and permission grants.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use tms_core::AppResult;
use tms_core::types::{Action, Resource, Tenant, UserId};
use tms_entity::permission::{PermissionManifest, TenantRole};

use crate::store::PermissionGrantStore;

/// Manifests keyed by user and tenant.
#[derive(Debug, Clone, Default)]
pub struct MemoryGrantStore {
    manifests: Arc<DashMap<(UserId, Tenant), PermissionManifest>>,
}

impl MemoryGrantStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&self, user_id: UserId, tenant: Tenant, resource: Resource, action: Action) {
        self.manifests
            .entry((user_id, tenant))
            .or_insert_with(|| PermissionManifest::empty(user_id, tenant))
            .grants
            .insert((resource, action));
    }

    pub fn assign_role(&self, user_id: UserId, tenant: Tenant, role: TenantRole) {
        self.manifests
            .entry((user_id, tenant))
            .or_insert_with(|| PermissionManifest::empty(user_id, tenant))
            .role = role;
    }

    /// Drop every grant and role of a user in `tenant`.
    pub fn revoke_all(&self, user_id: UserId, tenant: Tenant) {
        self.manifests.remove(&(user_id, tenant));
    }
}

#[async_trait]
impl PermissionGrantStore for MemoryGrantStore {
    async fn manifest(&self, user_id: UserId, tenant: Tenant) -> AppResult<PermissionManifest> {
        Ok(self
            .manifests
            .get(&(user_id, tenant))
            .map(|m| m.value().clone())
            .unwrap_or_else(|| PermissionManifest::empty(user_id, tenant)))
    }
}
