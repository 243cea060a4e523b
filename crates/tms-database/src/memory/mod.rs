//! In-memory storage backend.
//!
//! Records are kept as JSON documents per table. Writes go through a
//! [`MemoryTransaction`] that works on a copy of every table and swaps it
//! in on commit, so a failed or cancelled write leaves nothing behind.

mod audit;
mod children;
mod permission;
mod query;
mod repository;
mod uniqueness;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tms_core::traits::record::{BUSINESS_UNIT_FIELD, ID_FIELD, ORGANIZATION_FIELD};
use tms_core::types::{RecordId, Tenant};

pub use audit::MemoryAuditRepository;
pub use children::MemoryChildWriter;
pub use permission::MemoryGrantStore;
pub use repository::MemoryRepository;
pub use uniqueness::MemoryUniquenessChecker;

/// Table name to rows.
pub type Tables = HashMap<&'static str, Vec<Value>>;

/// Shared set of in-memory tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    write_latency: Option<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write waits `latency` before committing.
    pub fn with_write_latency(mut self, latency: Duration) -> Self {
        self.write_latency = Some(latency);
        self
    }

    /// Shared read access to every table.
    pub async fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().await
    }

    /// Start a write. Writers are serialized.
    pub async fn begin(&self) -> MemoryTransaction<'_> {
        let guard = self.tables.write().await;
        let working = guard.clone();
        MemoryTransaction {
            guard,
            working,
            latency: self.write_latency,
        }
    }

    /// Number of rows currently committed to `table`.
    pub async fn row_count(&self, table: &str) -> usize {
        self.tables.read().await.get(table).map_or(0, Vec::len)
    }
}

/// Working copy of the tables. Dropped without [`commit`](Self::commit),
/// every change is discarded.
pub struct MemoryTransaction<'a> {
    guard: RwLockWriteGuard<'a, Tables>,
    working: Tables,
    latency: Option<Duration>,
}

impl MemoryTransaction<'_> {
    pub fn tables(&self) -> &Tables {
        &self.working
    }

    pub fn tables_mut(&mut self) -> &mut Tables {
        &mut self.working
    }

    /// Publish the working copy.
    pub async fn commit(mut self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        *self.guard = std::mem::take(&mut self.working);
    }
}

/// Identifier stored under `id` in a JSON document.
pub fn json_id(value: &Value) -> Option<RecordId> {
    value.get(ID_FIELD)?.as_str()?.parse().ok()
}

/// Whether a JSON document belongs to `tenant`.
pub fn in_tenant(value: &Value, tenant: &Tenant) -> bool {
    field_is(value, ORGANIZATION_FIELD, &tenant.organization_id.to_string())
        && field_is(value, BUSINESS_UNIT_FIELD, &tenant.business_unit_id.to_string())
}

fn field_is(value: &Value, field: &str, expected: &str) -> bool {
    value.get(field).and_then(Value::as_str) == Some(expected)
}

/// Textual form of a JSON scalar as PostgreSQL would print it.
pub fn json_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
