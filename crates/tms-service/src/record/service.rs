//! Generic service template shared by every domain record.
//!
//! Each operation checks permission, stamps the caller's tenant,
//! validates, writes through the repository and appends an audit entry.
//! Everything up to and including the write runs under the request
//! deadline. The audit append is best effort: its failure is logged and
//! never undoes or fails the write.

use std::sync::Arc;

use tracing::{error, info};

use tms_core::traits::{DomainRecord, PermissionService, VersionedRepository};
use tms_core::types::{Action, GetOptions, ListOptions, ListResult, RequestContext, SelectOption};
use tms_core::{AppError, AppResult, ValidationContext};
use tms_entity::audit::AuditAction;

use crate::audit::{AuditService, LogActionParams, LogOption, with_comment, with_diff};
use crate::permission::require_permission;
use crate::validation::RecordValidator;

/// List, read, create and update for records of type `R`.
pub struct RecordService<R: DomainRecord> {
    pub(crate) repo: Arc<dyn VersionedRepository<R>>,
    permissions: Arc<dyn PermissionService>,
    validator: Arc<RecordValidator<R>>,
    audit: Arc<AuditService>,
}

impl<R: DomainRecord> Clone for RecordService<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            permissions: Arc::clone(&self.permissions),
            validator: Arc::clone(&self.validator),
            audit: Arc::clone(&self.audit),
        }
    }
}

impl<R: DomainRecord> RecordService<R> {
    pub fn new(
        repo: Arc<dyn VersionedRepository<R>>,
        permissions: Arc<dyn PermissionService>,
        validator: Arc<RecordValidator<R>>,
        audit: Arc<AuditService>,
    ) -> Self {
        Self {
            repo,
            permissions,
            validator,
            audit,
        }
    }

    pub fn validator(&self) -> &RecordValidator<R> {
        &self.validator
    }

    pub(crate) async fn authorize(&self, ctx: &RequestContext, action: Action) -> AppResult<()> {
        require_permission(self.permissions.as_ref(), &ctx.tenant, R::RESOURCE, action).await
    }

    /// Picker projection of the records matching `opts`.
    pub async fn select_options(
        &self,
        ctx: &RequestContext,
        opts: &ListOptions,
    ) -> AppResult<Vec<SelectOption>> {
        let what = format!("select {} options", R::MODEL_NAME);
        ctx.within(&what, async {
            self.authorize(ctx, Action::Read).await?;
            let page = self.repo.list(&ctx.tenant, opts).await?;
            Ok(page.items.iter().map(DomainRecord::select_option).collect())
        })
        .await
    }

    pub async fn list(&self, ctx: &RequestContext, opts: &ListOptions) -> AppResult<ListResult<R>> {
        let what = format!("list {}", R::RESOURCE.label());
        ctx.within(&what, async {
            self.authorize(ctx, Action::Read).await?;
            self.repo.list(&ctx.tenant, opts).await
        })
        .await
    }

    pub async fn get(&self, ctx: &RequestContext, opts: &GetOptions) -> AppResult<R> {
        let what = format!("get {}", R::MODEL_NAME);
        ctx.within(&what, async {
            self.authorize(ctx, Action::Read).await?;
            self.repo.get_by_id(&ctx.tenant, opts).await
        })
        .await
    }

    /// Create `record` in the caller's tenant. Any tenant or id the
    /// caller put on the record is overwritten or rejected.
    pub async fn create(&self, ctx: &RequestContext, mut record: R) -> AppResult<R> {
        let what = format!("create {}", R::MODEL_NAME);
        let created = ctx
            .within(&what, async {
                self.authorize(ctx, Action::Create).await?;
                record.set_tenant(ctx.tenant.tenant());
                self.validator
                    .validate(&record, &ValidationContext::create(ctx.tenant))
                    .await?;
                self.repo.create(record).await
            })
            .await?;

        let id = record_id(&created)?;
        info!(
            user_id = %ctx.tenant.user_id,
            model = R::MODEL_NAME,
            record_id = %id,
            "Record created"
        );

        let comment = vec![with_comment(format!("{} created", capitalize(R::MODEL_NAME)))];
        self.append_audit(ctx, AuditAction::Create, id.to_string(), None, &created, comment)
            .await;
        Ok(created)
    }

    /// Replace a record of the caller's tenant, provided nobody changed it
    /// since `record.version()` was read.
    pub async fn update(&self, ctx: &RequestContext, mut record: R) -> AppResult<R> {
        let what = format!("update {}", R::MODEL_NAME);
        let (previous, updated) = ctx
            .within(&what, async {
                self.authorize(ctx, Action::Update).await?;
                record.set_tenant(ctx.tenant.tenant());
                self.validator
                    .validate(&record, &ValidationContext::update(ctx.tenant))
                    .await?;

                let id = record_id(&record)?;
                let previous = self
                    .repo
                    .get_by_id(&ctx.tenant, &GetOptions::expanded(id))
                    .await?;
                let updated = self.repo.update(record).await?;
                Ok((previous, updated))
            })
            .await?;

        let id = record_id(&updated)?;
        info!(
            user_id = %ctx.tenant.user_id,
            model = R::MODEL_NAME,
            record_id = %id,
            version = updated.version(),
            "Record updated"
        );

        let options = vec![
            with_comment(format!("{} updated", capitalize(R::MODEL_NAME))),
            with_diff(&previous, &updated),
        ];
        self.append_audit(ctx, AuditAction::Update, id.to_string(), Some(&previous), &updated, options)
            .await;
        Ok(updated)
    }

    /// Best-effort audit append. Failures and deadline expiry are logged.
    async fn append_audit(
        &self,
        ctx: &RequestContext,
        action: AuditAction,
        resource_id: String,
        previous: Option<&R>,
        current: &R,
        options: Vec<LogOption>,
    ) {
        let result = ctx
            .within("audit logging", async {
                let params = LogActionParams {
                    resource: R::RESOURCE,
                    resource_id: resource_id.clone(),
                    action,
                    ctx: ctx.clone(),
                    previous_state: previous.map(serde_json::to_value).transpose()?,
                    current_state: Some(serde_json::to_value(current)?),
                };
                self.audit.log_action(params, options).await
            })
            .await;

        if let Err(e) = result {
            error!(
                error = %e,
                resource = %R::RESOURCE,
                resource_id = %resource_id,
                %action,
                "Failed to log audit action"
            );
        }
    }
}

fn capitalize(noun: &str) -> String {
    let mut chars = noun.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn record_id<R: DomainRecord>(record: &R) -> AppResult<tms_core::types::RecordId> {
    record
        .id()
        .ok_or_else(|| AppError::internal(format!("{} has no id", R::MODEL_NAME)))
}
