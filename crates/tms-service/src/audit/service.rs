//! Audit service: builds entries, diffs and masks them, and persists them.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Value, json};
use tracing::{debug, info};

use tms_core::AppResult;
use tms_core::config::AuditConfig;
use tms_core::traits::PermissionService;
use tms_core::types::{Action, AuditEntryId, ListResult, RequestContext, Resource};
use tms_database::{AuditQuery, AuditRepository};
use tms_entity::audit::{AuditAction, AuditEntry, CreateAuditEntry};

use super::diff::{Changes, DiffOptions, JsonDiffer, timestamps_equal};
use super::options::{LogOption, LogOptions};
use super::sensitive::{SensitiveAction, SensitiveFields};
use crate::permission::require_permission;

/// Version of the entry layout, stamped into every entry's metadata.
pub const AUDIT_VERSION: u32 = 1;

/// Who did what to which record.
#[derive(Debug, Clone)]
pub struct LogActionParams {
    pub resource: Resource,
    pub resource_id: String,
    pub action: AuditAction,
    pub ctx: RequestContext,
    pub previous_state: Option<Value>,
    pub current_state: Option<Value>,
}

/// Writes and reads the audit trail.
pub struct AuditService {
    repo: Arc<dyn AuditRepository>,
    permissions: Arc<dyn PermissionService>,
    differ: JsonDiffer,
    sensitive: SensitiveFields,
    config: AuditConfig,
}

impl AuditService {
    pub fn new(
        repo: Arc<dyn AuditRepository>,
        permissions: Arc<dyn PermissionService>,
        config: AuditConfig,
    ) -> AppResult<Self> {
        let differ = JsonDiffer::new(
            DiffOptions::default()
                .ignore_fields(config.diff_ignore_fields.iter().cloned())
                .compare_with("createdAt", timestamps_equal)
                .compare_with("updatedAt", timestamps_equal)
                .with_max_depth(config.diff_max_depth)
                .with_ignore_case(config.diff_ignore_case),
        );
        let sensitive = SensitiveFields::from_config(&config.sensitive_fields)?;

        Ok(Self {
            repo,
            permissions,
            differ,
            sensitive,
            config,
        })
    }

    /// Mask or omit `fields` of `resource` in every future entry.
    pub fn register_sensitive_fields(&self, resource: Resource, fields: &[(&str, SensitiveAction)]) {
        for (field, action) in fields {
            self.sensitive.register(resource, *field, *action);
        }
    }

    /// Persist one entry. Returns `None` when auditing is disabled.
    pub async fn log_action(
        &self,
        params: LogActionParams,
        options: Vec<LogOption>,
    ) -> AppResult<Option<AuditEntry>> {
        if !self.config.enabled {
            return Ok(None);
        }

        let opts = LogOptions::collect(options)?;
        let mut changes = match &opts.diff {
            Some((before, after)) => self.differ.diff(before, after)?,
            None => Changes::new(),
        };

        let resource = params.resource;
        let mut previous_state = params.previous_state;
        let mut current_state = params.current_state;
        for state in [&mut previous_state, &mut current_state].into_iter().flatten() {
            self.sensitive.apply_to_state(resource, state);
        }
        self.sensitive.apply_to_changes(resource, &mut changes);

        let mut metadata = opts.metadata;
        metadata
            .entry("auditVersion")
            .or_insert_with(|| json!(AUDIT_VERSION));

        let tenant = params.ctx.tenant;
        let entry = CreateAuditEntry {
            resource,
            resource_id: params.resource_id,
            action: params.action,
            user_id: tenant.user_id,
            organization_id: tenant.organization_id,
            business_unit_id: tenant.business_unit_id,
            previous_state,
            current_state,
            changes,
            comment: opts.comment,
            category: self.config.category.clone(),
            metadata: Value::Object(metadata),
            critical: opts.critical,
            timestamp: Utc::now(),
        };

        let entry = self.repo.insert(entry).await?;

        debug!(
            entry_id = %entry.id,
            resource = %entry.resource,
            resource_id = %entry.resource_id,
            action = %entry.action,
            changes = entry.changes.len(),
            "Audit entry recorded"
        );

        Ok(Some(entry))
    }

    /// Audit trail of the caller's tenant.
    pub async fn list(&self, ctx: &RequestContext, query: AuditQuery) -> AppResult<ListResult<AuditEntry>> {
        ctx.within("list audit entries", async {
            require_permission(self.permissions.as_ref(), &ctx.tenant, Resource::AuditEntry, Action::Read)
                .await?;
            let result = self.repo.list(&ctx.tenant.tenant(), &query).await?;

            info!(
                user_id = %ctx.tenant.user_id,
                total = result.total,
                "Listed audit entries"
            );
            Ok(result)
        })
        .await
    }

    /// One entry of the caller's tenant.
    pub async fn get(&self, ctx: &RequestContext, id: AuditEntryId) -> AppResult<AuditEntry> {
        ctx.within("get audit entry", async {
            require_permission(self.permissions.as_ref(), &ctx.tenant, Resource::AuditEntry, Action::Read)
                .await?;
            self.repo.get_by_id(&ctx.tenant.tenant(), id).await
        })
        .await
    }

    /// Audit trail of one record, newest first.
    pub async fn list_by_resource(
        &self,
        ctx: &RequestContext,
        resource: Resource,
        resource_id: impl Into<String>,
    ) -> AppResult<ListResult<AuditEntry>> {
        self.list(ctx, AuditQuery::for_resource(resource, resource_id))
            .await
    }
}
