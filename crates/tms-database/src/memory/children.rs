//! Child collections stored as JSON documents in their own tables.

use async_trait::async_trait;
use serde_json::{Value, json};

use tms_core::traits::record::{BUSINESS_UNIT_FIELD, ID_FIELD, ORGANIZATION_FIELD};
use tms_core::traits::{ChildCollection, ChildWriter};
use tms_core::types::{RecordId, Tenant};
use tms_core::{AppError, AppResult};

use super::{Tables, in_tenant, json_id};

/// Writes the children of one parent into a transaction's working tables.
pub struct MemoryChildWriter<'t> {
    tables: &'t mut Tables,
    collection: &'static ChildCollection,
    parent_id: RecordId,
    tenant: Tenant,
}

impl<'t> MemoryChildWriter<'t> {
    pub fn new(
        tables: &'t mut Tables,
        collection: &'static ChildCollection,
        parent_id: RecordId,
        tenant: Tenant,
    ) -> Self {
        Self {
            tables,
            collection,
            parent_id,
            tenant,
        }
    }

    /// Point `child` at the parent and its tenant.
    pub fn attach(&self, child: &mut Value) {
        if let Value::Object(map) = child {
            map.insert(self.collection.parent_field.to_string(), json!(self.parent_id));
            map.insert(ORGANIZATION_FIELD.to_string(), json!(self.tenant.organization_id));
            map.insert(BUSINESS_UNIT_FIELD.to_string(), json!(self.tenant.business_unit_id));
        }
    }

    fn owns(&self, row: &Value) -> bool {
        owned_by(row, self.collection, self.parent_id, &self.tenant)
    }

    fn rows(&mut self) -> &mut Vec<Value> {
        self.tables.entry(self.collection.table).or_default()
    }
}

/// Whether `row` is a child of `parent_id` in `tenant`.
pub fn owned_by(row: &Value, collection: &ChildCollection, parent_id: RecordId, tenant: &Tenant) -> bool {
    row.get(collection.parent_field).and_then(Value::as_str) == Some(&parent_id.to_string())
        && in_tenant(row, tenant)
}

/// Stored children of `parent_id`, oldest first.
pub fn children_of(
    tables: &Tables,
    collection: &ChildCollection,
    parent_id: RecordId,
    tenant: &Tenant,
) -> Vec<Value> {
    tables
        .get(collection.table)
        .map(|rows| {
            rows.iter()
                .filter(|row| owned_by(row, collection, parent_id, tenant))
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl ChildWriter<Value> for MemoryChildWriter<'_> {
    async fn insert(&mut self, mut child: Value) -> AppResult<Value> {
        if let Value::Object(map) = &mut child {
            map.insert(ID_FIELD.to_string(), json!(RecordId::new()));
        }
        self.rows().push(child.clone());
        Ok(child)
    }

    async fn update(&mut self, child: Value) -> AppResult<Value> {
        let id = json_id(&child).ok_or_else(|| AppError::internal("Child update without an id"))?;
        let position = self
            .tables
            .get(self.collection.table)
            .and_then(|rows| rows.iter().position(|row| json_id(row) == Some(id) && self.owns(row)));
        let table = self.collection.table;
        match position {
            Some(index) => {
                self.rows()[index] = child.clone();
                Ok(child)
            }
            None => Err(AppError::not_found(format!(
                "Child record {id} not found in {table}"
            ))),
        }
    }

    async fn delete(&mut self, id: RecordId) -> AppResult<()> {
        let collection = self.collection;
        let parent_id = self.parent_id;
        let tenant = self.tenant;
        self.rows()
            .retain(|row| !(json_id(row) == Some(id) && owned_by(row, collection, parent_id, &tenant)));
        Ok(())
    }
}
