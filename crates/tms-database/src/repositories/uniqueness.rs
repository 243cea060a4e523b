//! Uniqueness lookup against PostgreSQL.

use async_trait::async_trait;
use sqlx::{Executor, PgPool, Postgres, QueryBuilder, Row};

use tms_core::AppResult;
use tms_core::traits::{UniqueFieldValue, UniquenessChecker, UniquenessSpec};

use crate::error::database_error;

/// Looks up every unique field of a record with a single query.
#[derive(Debug, Clone)]
pub struct PgUniquenessChecker {
    pool: PgPool,
}

impl PgUniquenessChecker {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// `SELECT bool_or(<match field 0>), bool_or(<match field 1>) ... FROM table
/// WHERE <tenant> [AND id <> pk]`
fn conflict_query(spec: &UniquenessSpec) -> QueryBuilder<'_, Postgres> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT ");
    for (i, field) in spec.fields.iter().enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        if field.field.case_sensitive {
            builder
                .push("bool_or(CAST(")
                .push(field.field.column)
                .push(" AS TEXT) = ")
                .push_bind(field.value.as_str())
                .push(")");
        } else {
            builder
                .push("bool_or(lower(CAST(")
                .push(field.field.column)
                .push(" AS TEXT)) = lower(")
                .push_bind(field.value.as_str())
                .push("))");
        }
    }
    builder
        .push(" FROM ")
        .push(spec.table)
        .push(" WHERE organization_id = ")
        .push_bind(spec.tenant.organization_id)
        .push(" AND business_unit_id = ")
        .push_bind(spec.tenant.business_unit_id);
    if let Some(pk) = spec.primary_key {
        builder.push(" AND id <> ").push_bind(pk);
    }
    builder
}

/// Run the lookup for `spec` on `executor`: the pool, or the connection
/// of an open write transaction.
pub async fn conflicts_on<'e, E>(executor: E, spec: &UniquenessSpec) -> AppResult<Vec<UniqueFieldValue>>
where
    E: Executor<'e, Database = Postgres>,
{
    if spec.is_empty() {
        return Ok(Vec::new());
    }

    let mut query = conflict_query(spec);
    let row = query
        .build()
        .fetch_one(executor)
        .await
        .map_err(|e| database_error(&format!("Failed to check uniqueness of {}", spec.model_name), e))?;

    let mut conflicts = Vec::new();
    for (i, field) in spec.fields.iter().enumerate() {
        let taken: Option<bool> = row
            .try_get(i)
            .map_err(|e| database_error("Failed to look up unique values", e))?;
        if taken.unwrap_or(false) {
            conflicts.push(field.clone());
        }
    }
    Ok(conflicts)
}

#[async_trait]
impl UniquenessChecker for PgUniquenessChecker {
    async fn find_conflicts(&self, spec: &UniquenessSpec) -> AppResult<Vec<UniqueFieldValue>> {
        conflicts_on(&self.pool, spec).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tms_core::traits::{UniqueField, UniquenessOperation};
    use tms_core::types::{BusinessUnitId, OrganizationId, RecordId, Tenant};

    fn spec(primary_key: Option<RecordId>) -> UniquenessSpec {
        UniquenessSpec {
            table: "tractors",
            tenant: Tenant::new(OrganizationId::new(), BusinessUnitId::new()),
            model_name: "tractor",
            fields: vec![UniqueFieldValue {
                field: UniqueField::new("code", "code", "Tractor with code :value already exists"),
                value: "TRK-1".to_string(),
            }],
            operation: UniquenessOperation::Update,
            primary_key,
        }
    }

    #[test]
    fn test_lookup_excludes_primary_key_on_update() {
        let spec = spec(Some(RecordId::new()));
        let sql = conflict_query(&spec).into_sql();
        assert_eq!(
            sql,
            "SELECT bool_or(lower(CAST(code AS TEXT)) = lower($1)) FROM tractors \
             WHERE organization_id = $2 AND business_unit_id = $3 AND id <> $4"
        );
    }

    #[test]
    fn test_lookup_without_primary_key() {
        let spec = spec(None);
        let sql = conflict_query(&spec).into_sql();
        assert!(sql.ends_with("business_unit_id = $3"));
    }
}
