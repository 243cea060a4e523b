//! Audit entry repository implementation.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use tms_core::types::{AuditEntryId, ListResult, Tenant};
use tms_core::{AppError, AppResult};
use tms_entity::audit::{AuditEntry, CreateAuditEntry};

use crate::error::database_error;
use crate::store::{AuditQuery, AuditRepository};

/// Append-only storage of audit entries in `audit_entries`.
#[derive(Debug, Clone)]
pub struct PgAuditLogRepository {
    pool: PgPool,
}

impl PgAuditLogRepository {
    /// Create a new audit entry repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_scope<'a>(builder: &mut QueryBuilder<'a, Postgres>, tenant: &Tenant, query: &'a AuditQuery) {
    builder
        .push(" WHERE organization_id = ")
        .push_bind(tenant.organization_id)
        .push(" AND business_unit_id = ")
        .push_bind(tenant.business_unit_id);
    if let Some(resource) = query.resource {
        builder.push(" AND resource = ").push_bind(resource.as_str());
    }
    if let Some(resource_id) = &query.resource_id {
        builder.push(" AND resource_id = ").push_bind(resource_id.as_str());
    }
}

#[async_trait]
impl AuditRepository for PgAuditLogRepository {
    async fn insert(&self, entry: CreateAuditEntry) -> AppResult<AuditEntry> {
        let entry = entry.into_entry();
        sqlx::query(
            "INSERT INTO audit_entries (id, resource, resource_id, action, user_id, organization_id, \
             business_unit_id, previous_state, current_state, changes, comment, category, metadata, \
             critical, timestamp) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
        )
        .bind(entry.id)
        .bind(entry.resource.as_str())
        .bind(&entry.resource_id)
        .bind(entry.action.as_str())
        .bind(entry.user_id)
        .bind(entry.organization_id)
        .bind(entry.business_unit_id)
        .bind(&entry.previous_state)
        .bind(&entry.current_state)
        .bind(Json(&entry.changes))
        .bind(&entry.comment)
        .bind(&entry.category)
        .bind(&entry.metadata)
        .bind(entry.critical)
        .bind(entry.timestamp)
        .execute(&self.pool)
        .await
        .map_err(|e| database_error("Failed to create audit entry", e))?;
        Ok(entry)
    }

    async fn get_by_id(&self, tenant: &Tenant, id: AuditEntryId) -> AppResult<AuditEntry> {
        sqlx::query_as::<_, AuditEntry>(
            "SELECT * FROM audit_entries \
             WHERE id = $1 AND organization_id = $2 AND business_unit_id = $3",
        )
        .bind(id)
        .bind(tenant.organization_id)
        .bind(tenant.business_unit_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database_error("Failed to find audit entry", e))?
        .ok_or_else(|| AppError::record_not_found("audit entry"))
    }

    async fn list(&self, tenant: &Tenant, query: &AuditQuery) -> AppResult<ListResult<AuditEntry>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM audit_entries");
        push_scope(&mut count, tenant, query);
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| database_error("Failed to count audit entries", e))?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT * FROM audit_entries");
        push_scope(&mut select, tenant, query);
        select
            .push(" ORDER BY timestamp DESC, id DESC LIMIT ")
            .push_bind(query.limit() as i64)
            .push(" OFFSET ")
            .push_bind(query.offset as i64);

        let entries = select
            .build_query_as::<AuditEntry>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| database_error("Failed to search audit entries", e))?;

        Ok(ListResult::new(entries, total.max(0) as u64))
    }
}
