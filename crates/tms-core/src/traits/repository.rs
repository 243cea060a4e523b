//! Tenant-scoped repository contract for versioned records.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::traits::record::DomainRecord;
use crate::types::pagination::{GetOptions, ListOptions, ListResult};
use crate::types::tenant::TenantContext;

/// Storage contract every domain record type is persisted through.
///
/// Implementations filter every read by the caller's tenant, so a record
/// owned by another tenant is indistinguishable from a missing one.
#[async_trait]
pub trait VersionedRepository<R>: Send + Sync + 'static
where
    R: DomainRecord,
{
    /// Tenant-filtered page of records plus the total match count.
    async fn list(&self, tenant: &TenantContext, opts: &ListOptions) -> AppResult<ListResult<R>>;

    /// A single record of the tenant, or `NotFound`.
    async fn get_by_id(&self, tenant: &TenantContext, opts: &GetOptions) -> AppResult<R>;

    /// Insert `record` with a fresh id and `version = 1`, together with its
    /// child collections, in one transaction.
    async fn create(&self, record: R) -> AppResult<R>;

    /// Replace the stored record if its version still equals
    /// `record.version()`. Bumps the version by one, refreshes
    /// `updated_at` and reconciles child collections, in one transaction.
    async fn update(&self, record: R) -> AppResult<R>;
}
