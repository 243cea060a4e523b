//! Mapping of domain records onto PostgreSQL tables.
//!
//! Every table carries the bookkeeping columns `id`, `organization_id`,
//! `business_unit_id`, `version`, `created_at` and `updated_at`; a record
//! binds its remaining columns through a [`ColumnSink`].

mod commodity;
mod equipment_type;
mod location;
mod tractor;
mod worker;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Encode, FromRow, PgConnection, Postgres, QueryBuilder, Type};

use tms_core::traits::{ChildRecord, DomainRecord};
use tms_core::{AppError, AppResult};

/// Receives `(column, value)` pairs in a fixed order.
pub trait ColumnSink<'args> {
    fn bind<T>(&mut self, column: &'static str, value: T) -> &mut Self
    where
        T: 'args + Encode<'args, Postgres> + Type<Postgres> + Send;
}

/// Collects column names and drops the values.
#[derive(Debug, Default)]
pub struct ColumnNames {
    pub names: Vec<&'static str>,
}

impl<'args> ColumnSink<'args> for ColumnNames {
    fn bind<T>(&mut self, column: &'static str, _value: T) -> &mut Self
    where
        T: 'args + Encode<'args, Postgres> + Type<Postgres> + Send,
    {
        self.names.push(column);
        self
    }
}

/// Pushes bound values into a query, either as a comma-separated value
/// list or as `column = value` assignments.
pub struct BoundColumns<'qb, 'args> {
    builder: &'qb mut QueryBuilder<'args, Postgres>,
    assignments: bool,
    count: usize,
}

impl<'qb, 'args> BoundColumns<'qb, 'args> {
    /// `$1, $2, ...` for an `INSERT ... VALUES (...)` list.
    pub fn values(builder: &'qb mut QueryBuilder<'args, Postgres>) -> Self {
        Self {
            builder,
            assignments: false,
            count: 0,
        }
    }

    /// `a = $1, b = $2, ...` for an `UPDATE ... SET` list.
    pub fn assignments(builder: &'qb mut QueryBuilder<'args, Postgres>) -> Self {
        Self {
            builder,
            assignments: true,
            count: 0,
        }
    }
}

impl<'args> ColumnSink<'args> for BoundColumns<'_, 'args> {
    fn bind<T>(&mut self, column: &'static str, value: T) -> &mut Self
    where
        T: 'args + Encode<'args, Postgres> + Type<Postgres> + Send,
    {
        if self.count > 0 {
            self.builder.push(", ");
        }
        if self.assignments {
            self.builder.push(column).push(" = ");
        }
        self.builder.push_bind(value);
        self.count += 1;
        self
    }
}

/// A domain record stored in its own table.
#[async_trait]
pub trait PgTable: DomainRecord + for<'r> FromRow<'r, PgRow> {
    /// Bind every non-bookkeeping column, in a stable order.
    fn bind_columns<'args, S: ColumnSink<'args>>(&self, sink: &mut S);

    /// Load child collections and other relations.
    async fn load_relations(&mut self, _conn: &mut PgConnection) -> AppResult<()> {
        Ok(())
    }

    /// Reconcile child collections with storage. Runs inside the parent's
    /// write transaction after the parent row is written.
    async fn save_relations(&mut self, _conn: &mut PgConnection) -> AppResult<()> {
        Ok(())
    }
}

/// A child record stored in its own table under a parent id column.
pub trait PgChildTable: ChildRecord + for<'r> FromRow<'r, PgRow> {
    const TABLE: &'static str;
    const PARENT_COLUMN: &'static str;

    /// Bind every column except `id`, the tenant columns and the parent
    /// column.
    fn bind_columns<'args, S: ColumnSink<'args>>(&self, sink: &mut S);
}

/// Column backing a JSON field name (`equipmentTypeId` → `equipment_type_id`).
///
/// Only plain identifiers are accepted, so the result is safe to splice
/// into SQL.
pub fn column_name(field: &str) -> AppResult<String> {
    let mut column = String::with_capacity(field.len() + 4);
    for c in field.chars() {
        match c {
            'A'..='Z' => {
                column.push('_');
                column.push(c.to_ascii_lowercase());
            }
            'a'..='z' | '0'..='9' | '_' => column.push(c),
            _ => return Err(AppError::validation(format!("Unknown field: '{field}'"))),
        }
    }
    if column.is_empty() || column.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(AppError::validation(format!("Unknown field: '{field}'")));
    }
    // JSON digits follow a word directly (`addressLine1`); columns separate
    // them (`address_line_1`).
    Ok(separate_trailing_digits(&column))
}

fn separate_trailing_digits(column: &str) -> String {
    let mut out = String::with_capacity(column.len() + 1);
    let mut previous: Option<char> = None;
    for c in column.chars() {
        if c.is_ascii_digit() && previous.is_some_and(|p| p.is_ascii_lowercase()) {
            out.push('_');
        }
        out.push(c);
        previous = Some(c);
    }
    out
}
