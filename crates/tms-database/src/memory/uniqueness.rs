//! Uniqueness lookup over in-memory tables.

use async_trait::async_trait;
use serde_json::Value;

use tms_core::AppResult;
use tms_core::traits::{UniqueFieldValue, UniquenessChecker, UniquenessSpec};

use super::{MemoryStore, Tables, in_tenant, json_id, json_text};

#[derive(Debug, Clone)]
pub struct MemoryUniquenessChecker {
    store: MemoryStore,
}

impl MemoryUniquenessChecker {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

fn holds(row: &Value, field: &UniqueFieldValue) -> bool {
    let Some(stored) = row.get(field.field.field).and_then(json_text) else {
        return false;
    };
    if field.field.case_sensitive {
        stored == field.value
    } else {
        stored.to_lowercase() == field.value.to_lowercase()
    }
}

/// The fields of `spec` already taken in `tables`.
pub(super) fn conflicts_in(tables: &Tables, spec: &UniquenessSpec) -> Vec<UniqueFieldValue> {
    let candidates: Vec<&Value> = tables
        .get(spec.table)
        .map(|rows| {
            rows.iter()
                .filter(|row| in_tenant(row, &spec.tenant))
                .filter(|row| spec.primary_key.is_none() || json_id(row) != spec.primary_key)
                .collect()
        })
        .unwrap_or_default();

    spec.fields
        .iter()
        .filter(|field| candidates.iter().any(|row| holds(row, field)))
        .cloned()
        .collect()
}

#[async_trait]
impl UniquenessChecker for MemoryUniquenessChecker {
    async fn find_conflicts(&self, spec: &UniquenessSpec) -> AppResult<Vec<UniqueFieldValue>> {
        if spec.is_empty() {
            return Ok(Vec::new());
        }
        Ok(conflicts_in(&*self.store.read().await, spec))
    }
}
