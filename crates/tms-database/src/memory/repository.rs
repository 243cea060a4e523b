//! Generic in-memory repository with the same observable behavior as
//! the PostgreSQL one.

use std::marker::PhantomData;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use tms_core::traits::record::{
    CREATED_AT_FIELD, UPDATED_AT_FIELD, VERSION_FIELD, next_timestamp,
    truncate_micros,
};
use tms_core::traits::{
    ChildCollection, DomainRecord, UniquenessOperation, UniquenessSpec, VersionedRepository,
    duplicate_errors, reconcile_children,
};
use tms_core::types::{GetOptions, ListOptions, ListResult, RecordId, Tenant, TenantContext};
use tms_core::{AppError, AppResult};

use super::children::{MemoryChildWriter, children_of};
use super::query::{check_filter, compare_rows, filter_matches, search_matches};
use super::uniqueness::conflicts_in;
use super::{MemoryStore, Tables, in_tenant, json_id, json_text};
use crate::error::duplicate_error;
use crate::transaction::run_scoped;

/// Stores `R` as JSON documents in `R::TABLE`.
pub struct MemoryRepository<R> {
    store: MemoryStore,
    single_connection: bool,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for MemoryRepository<R> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            single_connection: self.single_connection,
            _record: PhantomData,
        }
    }
}

impl<R: DomainRecord> MemoryRepository<R> {
    pub fn new(store: MemoryStore) -> Self {
        Self {
            store,
            single_connection: false,
            _record: PhantomData,
        }
    }

    /// Check the unique fields inside the write transaction, reporting
    /// every conflicting field.
    pub fn with_single_connection(mut self, enabled: bool) -> Self {
        self.single_connection = enabled;
        self
    }

    fn ensure_unique(
        enabled: bool,
        tables: &Tables,
        record: &R,
        operation: UniquenessOperation,
    ) -> AppResult<()> {
        if !enabled {
            return Ok(());
        }
        let spec = UniquenessSpec::for_record(record, operation)?;
        let errors = duplicate_errors(&conflicts_in(tables, &spec));
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::invalid(errors))
        }
    }

    /// Enforce the unique indexes of `R`: a value may appear once per
    /// tenant, ignoring case.
    fn check_unique_indexes(tables: &Tables, record: &R, row: &Value) -> AppResult<()> {
        let Some(rows) = tables.get(R::TABLE) else {
            return Ok(());
        };
        let own_id = record.id();
        let tenant = record.tenant();

        for field in R::UNIQUE_FIELDS {
            let Some(value) = row.get(field.field).and_then(json_text) else {
                continue;
            };
            let taken = rows.iter().any(|other| {
                json_id(other) != own_id
                    && in_tenant(other, &tenant)
                    && other
                        .get(field.field)
                        .and_then(json_text)
                        .is_some_and(|v| same_text(&v, &value, field.case_sensitive))
            });
            if taken {
                return Err(duplicate_error(record, &field.constraint_name(R::TABLE))
                    .unwrap_or_else(|| AppError::validation(field.render(&value))));
            }
        }
        Ok(())
    }

    /// Write `row` and its children into the working tables and return
    /// the persisted record.
    async fn write(
        tables: &mut Tables,
        record: &R,
        mut row: Value,
        existing_index: Option<usize>,
    ) -> AppResult<R> {
        let id = record
            .id()
            .ok_or_else(|| AppError::internal("Record written without an id"))?;
        let tenant = record.tenant();
        let children = detach_children::<R>(&mut row);

        Self::check_unique_indexes(tables, record, &row)?;
        let table = tables.entry(R::TABLE).or_default();
        match existing_index {
            Some(index) => table[index] = row.clone(),
            None => table.push(row.clone()),
        }

        for (collection, incoming) in children {
            let existing = children_of(tables, collection, id, &tenant);
            let mut writer = MemoryChildWriter::new(tables, collection, id, tenant);
            let mut incoming = incoming;
            for child in &mut incoming {
                writer.attach(child);
            }
            let persisted = reconcile_children(&existing, incoming, json_id, &mut writer).await?;
            if let Value::Object(map) = &mut row {
                map.insert(collection.field.to_string(), Value::Array(persisted));
            }
        }

        Ok(serde_json::from_value(row)?)
    }
}

#[async_trait]
impl<R: DomainRecord> VersionedRepository<R> for MemoryRepository<R> {
    async fn list(&self, tenant: &TenantContext, opts: &ListOptions) -> AppResult<ListResult<R>> {
        for filter in &opts.filters {
            check_filter(filter)?;
        }

        let tables = self.store.read().await;
        let tenant = tenant.tenant();
        let mut rows: Vec<&Value> = tables
            .get(R::TABLE)
            .map(|rows| rows.iter().filter(|row| in_tenant(row, &tenant)).collect())
            .unwrap_or_default();

        if let Some(term) = opts.search_term() {
            rows.retain(|row| search_matches(row, R::SEARCH_FIELDS, term));
        }
        rows.retain(|row| opts.filters.iter().all(|f| filter_matches(row, f)));
        rows.sort_by(|a, b| compare_rows(a, b, &opts.sort, R::PRIMARY_FIELD));

        let total = rows.len() as u64;
        let items = rows
            .into_iter()
            .skip(opts.offset() as usize)
            .take(opts.limit() as usize)
            .map(|row| materialize::<R>(&tables, row, &tenant, opts.expand_relations))
            .collect::<AppResult<Vec<R>>>()?;

        Ok(ListResult::new(items, total))
    }

    async fn get_by_id(&self, tenant: &TenantContext, opts: &GetOptions) -> AppResult<R> {
        let tables = self.store.read().await;
        let tenant = tenant.tenant();
        let row = tables
            .get(R::TABLE)
            .and_then(|rows| {
                rows.iter()
                    .find(|row| json_id(row) == Some(opts.id) && in_tenant(row, &tenant))
            })
            .ok_or_else(|| AppError::record_not_found(R::MODEL_NAME))?;
        materialize::<R>(&tables, row, &tenant, opts.expand_relations)
    }

    async fn create(&self, mut record: R) -> AppResult<R> {
        let now = truncate_micros(Utc::now());
        record.set_id(RecordId::new());
        record.set_version(1);
        record.set_timestamps(now, now);
        let row = serde_json::to_value(&record)?;

        let single_connection = self.single_connection;
        let tx_name = format!("create {}", R::MODEL_NAME);
        run_scoped(self.store.begin().await, &tx_name, move |tables: &mut Tables| {
            Box::pin(async move {
                Self::ensure_unique(single_connection, tables, &record, UniquenessOperation::Create)?;
                Self::write(tables, &record, row, None).await
            })
        })
        .await
    }

    async fn update(&self, mut record: R) -> AppResult<R> {
        let id = record
            .id()
            .ok_or_else(|| AppError::validation(format!("{} id is required", R::MODEL_NAME)))?;
        let tenant = record.tenant();

        let single_connection = self.single_connection;
        let tx_name = format!("update {}", R::MODEL_NAME);
        run_scoped(self.store.begin().await, &tx_name, move |tables: &mut Tables| {
            Box::pin(async move {
                let (index, stored) = tables
                    .get(R::TABLE)
                    .and_then(|rows| {
                        rows.iter()
                            .enumerate()
                            .find(|(_, row)| json_id(row) == Some(id) && in_tenant(row, &tenant))
                    })
                    .map(|(index, row)| (index, row.clone()))
                    .ok_or_else(|| AppError::record_not_found(R::MODEL_NAME))?;

                let stored_version = stored.get(VERSION_FIELD).and_then(Value::as_i64).unwrap_or(0);
                if stored_version != record.version() {
                    return Err(AppError::version_conflict(R::PRIMARY_FIELD));
                }
                Self::ensure_unique(single_connection, tables, &record, UniquenessOperation::Update)?;
                let created_at = timestamp(&stored, CREATED_AT_FIELD)?;
                let updated_at = next_timestamp(timestamp(&stored, UPDATED_AT_FIELD)?);

                record.set_version(stored_version + 1);
                record.set_timestamps(created_at, updated_at);
                let row = serde_json::to_value(&record)?;

                Self::write(tables, &record, row, Some(index)).await
            })
        })
        .await
    }
}

/// Deserialize a stored row, attaching its children when requested.
fn materialize<R: DomainRecord>(tables: &Tables, row: &Value, tenant: &Tenant, expand: bool) -> AppResult<R> {
    let mut row = row.clone();
    if expand {
        if let (Some(id), Value::Object(map)) = (json_id(&row), &mut row) {
            for collection in R::CHILD_COLLECTIONS {
                let children = children_of(tables, collection, id, tenant);
                map.insert(collection.field.to_string(), Value::Array(children));
            }
        }
    }
    Ok(serde_json::from_value(row)?)
}

/// Remove child arrays from a parent document. Children are stored in
/// their own tables.
fn detach_children<R: DomainRecord>(
    row: &mut Value,
) -> Vec<(&'static ChildCollection, Vec<Value>)> {
    let Value::Object(map) = row else {
        return Vec::new();
    };
    R::CHILD_COLLECTIONS
        .iter()
        .map(|collection| (collection, take_array(map, collection.field)))
        .collect()
}

fn take_array(map: &mut Map<String, Value>, field: &str) -> Vec<Value> {
    match map.remove(field) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

fn timestamp(row: &Value, field: &str) -> AppResult<DateTime<Utc>> {
    let value = row.get(field).cloned().unwrap_or(Value::Null);
    Ok(serde_json::from_value(value)?)
}

fn same_text(a: &str, b: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        a == b
    } else {
        a.to_lowercase() == b.to_lowercase()
    }
}
