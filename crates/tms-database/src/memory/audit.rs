//! In-memory audit trail.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use tms_core::types::{AuditEntryId, ListResult, Tenant};
use tms_core::{AppError, AppResult};
use tms_entity::audit::{AuditEntry, CreateAuditEntry};

use crate::store::{AuditQuery, AuditRepository};

#[derive(Debug, Clone, Default)]
pub struct MemoryAuditRepository {
    entries: Arc<RwLock<Vec<AuditEntry>>>,
}

impl MemoryAuditRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored entry, oldest first.
    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl AuditRepository for MemoryAuditRepository {
    async fn insert(&self, entry: CreateAuditEntry) -> AppResult<AuditEntry> {
        let entry = entry.into_entry();
        self.entries.write().await.push(entry.clone());
        Ok(entry)
    }

    async fn get_by_id(&self, tenant: &Tenant, id: AuditEntryId) -> AppResult<AuditEntry> {
        self.entries
            .read()
            .await
            .iter()
            .find(|e| {
                e.id == id
                    && e.organization_id == tenant.organization_id
                    && e.business_unit_id == tenant.business_unit_id
            })
            .cloned()
            .ok_or_else(|| AppError::record_not_found("audit entry"))
    }

    async fn list(&self, tenant: &Tenant, query: &AuditQuery) -> AppResult<ListResult<AuditEntry>> {
        let entries = self.entries.read().await;
        let mut matching: Vec<&AuditEntry> = entries
            .iter()
            .filter(|e| {
                e.organization_id == tenant.organization_id
                    && e.business_unit_id == tenant.business_unit_id
            })
            .filter(|e| query.resource.is_none_or(|r| e.resource == r))
            .filter(|e| {
                query
                    .resource_id
                    .as_deref()
                    .is_none_or(|id| e.resource_id == id)
            })
            .collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit() as usize)
            .cloned()
            .collect();
        Ok(ListResult::new(items, total))
    }
}
