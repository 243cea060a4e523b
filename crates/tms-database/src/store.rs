//! Storage seams for audit entries and permission grants.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use tms_core::AppResult;
use tms_core::types::{AuditEntryId, ListResult, Resource, Tenant, UserId};
use tms_entity::audit::{AuditEntry, CreateAuditEntry};
use tms_entity::permission::PermissionManifest;

/// Filter for reading back the audit trail of a tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditQuery {
    pub resource: Option<Resource>,
    pub resource_id: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

impl Default for AuditQuery {
    fn default() -> Self {
        Self {
            resource: None,
            resource_id: None,
            limit: default_limit(),
            offset: 0,
        }
    }
}

impl AuditQuery {
    pub fn for_resource(resource: Resource, resource_id: impl Into<String>) -> Self {
        Self {
            resource: Some(resource),
            resource_id: Some(resource_id.into()),
            limit: default_limit(),
            offset: 0,
        }
    }

    pub fn limit(&self) -> u64 {
        self.limit.clamp(1, tms_core::types::pagination::MAX_LIMIT)
    }
}

fn default_limit() -> u64 {
    tms_core::types::pagination::DEFAULT_LIMIT
}

/// Append-only sink for audit entries.
#[async_trait]
pub trait AuditRepository: Send + Sync + 'static {
    /// Persist one entry.
    async fn insert(&self, entry: CreateAuditEntry) -> AppResult<AuditEntry>;

    /// One entry of `tenant`. Entries of other tenants are not found.
    async fn get_by_id(&self, tenant: &Tenant, id: AuditEntryId) -> AppResult<AuditEntry>;

    /// Entries of `tenant`, newest first.
    async fn list(&self, tenant: &Tenant, query: &AuditQuery) -> AppResult<ListResult<AuditEntry>>;
}

/// Source of per-tenant permission manifests.
#[async_trait]
pub trait PermissionGrantStore: Send + Sync + 'static {
    /// What `user_id` may do in `tenant`. A user without any grant gets an
    /// empty member manifest.
    async fn manifest(&self, user_id: UserId, tenant: Tenant) -> AppResult<PermissionManifest>;
}
