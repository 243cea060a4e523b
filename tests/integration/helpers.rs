//! Shared test helpers for integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;

use tms_core::config::{AuditConfig, ValidationConfig};
use tms_core::types::{
    Action, AuditEntryId, BusinessUnitId, ListResult, OrganizationId, RequestContext, Resource, Tenant,
    TenantContext, UserId,
};
use tms_core::{AppError, AppResult};
use tms_database::memory::{MemoryAuditRepository, MemoryGrantStore};
use tms_database::{AuditQuery, AuditRepository, MemoryStore};
use tms_entity::audit::{AuditEntry, CreateAuditEntry};
use tms_entity::permission::TenantRole;
use tms_service::{Repositories, ServiceCatalog};

/// The full service catalog over the in-memory store.
pub struct TestApp {
    pub catalog: ServiceCatalog,
    pub store: MemoryStore,
    pub grants: MemoryGrantStore,
    pub audit: MemoryAuditRepository,
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(MemoryStore::new(), None, AuditConfig::default(), ValidationConfig::default())
    }

    pub fn with_validation(validation: ValidationConfig) -> Self {
        Self::build(MemoryStore::new(), None, AuditConfig::default(), validation)
    }

    pub fn with_store(store: MemoryStore) -> Self {
        Self::build(store, None, AuditConfig::default(), ValidationConfig::default())
    }

    pub fn with_audit_sink(sink: Arc<dyn AuditRepository>) -> Self {
        Self::build(MemoryStore::new(), Some(sink), AuditConfig::default(), ValidationConfig::default())
    }

    pub fn with_audit_config(config: AuditConfig) -> Self {
        Self::build(MemoryStore::new(), None, config, ValidationConfig::default())
    }

    fn build(
        store: MemoryStore,
        sink: Option<Arc<dyn AuditRepository>>,
        config: AuditConfig,
        validation: ValidationConfig,
    ) -> Self {
        let grants = MemoryGrantStore::new();
        let audit = MemoryAuditRepository::new();
        let sink = sink.unwrap_or_else(|| Arc::new(audit.clone()));
        let repos =
            Repositories::in_memory_with(store.clone(), grants.clone(), &validation).with_audit(sink);
        let catalog = ServiceCatalog::new(repos, config, &validation)
            .expect("Failed to build service catalog");
        Self {
            catalog,
            store,
            grants,
            audit,
        }
    }

    /// A fresh tenant with an admin acting in it.
    pub fn admin(&self) -> RequestContext {
        let ctx = RequestContext::new(new_tenant_context());
        self.grants
            .assign_role(ctx.tenant.user_id, ctx.tenant.tenant(), TenantRole::Admin);
        ctx
    }

    /// A fresh tenant with a member holding `grants`.
    pub fn member(&self, grants: &[(Resource, Action)]) -> RequestContext {
        let tenant = new_tenant_context().tenant();
        self.member_of(tenant, grants)
    }

    /// A new member of `tenant` holding `grants`.
    pub fn member_of(&self, tenant: Tenant, grants: &[(Resource, Action)]) -> RequestContext {
        let ctx = RequestContext::new(TenantContext::new(
            tenant.organization_id,
            tenant.business_unit_id,
            UserId::new(),
        ));
        for (resource, action) in grants {
            self.grants
                .grant(ctx.tenant.user_id, tenant, *resource, *action);
        }
        ctx
    }
}

pub fn new_tenant_context() -> TenantContext {
    TenantContext::new(OrganizationId::new(), BusinessUnitId::new(), UserId::new())
}

/// Audit sink that rejects every write.
pub struct FailingAuditSink;

#[async_trait]
impl AuditRepository for FailingAuditSink {
    async fn insert(&self, _entry: CreateAuditEntry) -> AppResult<AuditEntry> {
        Err(AppError::database("audit sink unavailable"))
    }

    async fn get_by_id(&self, _tenant: &Tenant, _id: AuditEntryId) -> AppResult<AuditEntry> {
        Err(AppError::database("audit sink unavailable"))
    }

    async fn list(&self, _tenant: &Tenant, _query: &AuditQuery) -> AppResult<ListResult<AuditEntry>> {
        Err(AppError::database("audit sink unavailable"))
    }
}
