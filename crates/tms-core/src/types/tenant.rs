//! Tenant scoping and per-request context.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::error::AppError;
use crate::result::AppResult;
use crate::types::id::{BusinessUnitId, OrganizationId, UserId};

/// The `(organization, business unit)` pair every record is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub organization_id: OrganizationId,
    pub business_unit_id: BusinessUnitId,
}

impl Tenant {
    pub fn new(organization_id: OrganizationId, business_unit_id: BusinessUnitId) -> Self {
        Self {
            organization_id,
            business_unit_id,
        }
    }
}

impl fmt::Display for Tenant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.organization_id, self.business_unit_id)
    }
}

/// Tenant and acting user of a request. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantContext {
    pub organization_id: OrganizationId,
    pub business_unit_id: BusinessUnitId,
    pub user_id: UserId,
}

impl TenantContext {
    pub fn new(
        organization_id: OrganizationId,
        business_unit_id: BusinessUnitId,
        user_id: UserId,
    ) -> Self {
        Self {
            organization_id,
            business_unit_id,
            user_id,
        }
    }

    /// The scoping pair without the actor.
    pub fn tenant(&self) -> Tenant {
        Tenant::new(self.organization_id, self.business_unit_id)
    }
}

/// Context for one inbound call into a service.
///
/// Carries the resolved tenant and an optional deadline. Every stage up
/// to and including the transactional write runs under the deadline.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Who is acting, and for which tenant.
    pub tenant: TenantContext,
    /// Point in time after which the operation is abandoned.
    pub deadline: Option<Instant>,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a context without a deadline.
    pub fn new(tenant: TenantContext) -> Self {
        Self {
            tenant,
            deadline: None,
            request_time: Utc::now(),
        }
    }

    /// Returns a copy that expires `timeout` from now.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Returns a copy that expires at `deadline`.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Whether the deadline has already passed.
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Drive `fut` to completion unless the deadline passes first.
    ///
    /// Dropping `fut` on expiry cancels whatever it was doing; an open
    /// transaction inside it rolls back.
    pub async fn within<T, F>(&self, what: &str, fut: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, fut)
                .await
                .map_err(|_| AppError::timeout(format!("Deadline exceeded during {what}")))?,
            None => fut.await,
        }
    }
}
