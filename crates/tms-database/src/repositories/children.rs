//! Child-table reads and reconciliation inside a parent's transaction.

use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::{PgConnection, Postgres, QueryBuilder};

use tms_core::traits::{ChildRecord, ChildWriter, reconcile_children};
use tms_core::types::{RecordId, Tenant};
use tms_core::{AppError, AppResult};

use crate::error::database_error;
use crate::tables::{BoundColumns, ColumnNames, PgChildTable};

/// Children of `parent_id` within `tenant`, oldest first.
pub async fn load_children<C: PgChildTable>(
    conn: &mut PgConnection,
    parent_id: RecordId,
    tenant: Tenant,
) -> AppResult<Vec<C>> {
    let sql = format!(
        "SELECT * FROM {} WHERE {} = $1 AND organization_id = $2 AND business_unit_id = $3 ORDER BY id",
        C::TABLE,
        C::PARENT_COLUMN
    );
    sqlx::query_as::<_, C>(&sql)
        .bind(parent_id)
        .bind(tenant.organization_id)
        .bind(tenant.business_unit_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| database_error(&format!("Failed to load {}", C::TABLE), e))
}

/// Make the stored children of `parent_id` match `incoming` and return
/// them in submission order.
pub async fn sync_children<C: PgChildTable>(
    conn: &mut PgConnection,
    parent_id: RecordId,
    tenant: Tenant,
    mut incoming: Vec<C>,
) -> AppResult<Vec<C>> {
    let existing: Vec<C> = load_children(conn, parent_id, tenant).await?;
    for child in &mut incoming {
        child.attach(parent_id, tenant);
    }

    let mut writer = PgChildWriter::<C>::new(conn, parent_id, tenant);
    reconcile_children(&existing, incoming, |c| c.id(), &mut writer).await
}

/// Writes children of one parent through the parent's connection.
pub struct PgChildWriter<'c, C> {
    conn: &'c mut PgConnection,
    parent_id: RecordId,
    tenant: Tenant,
    _child: PhantomData<fn() -> C>,
}

impl<'c, C: PgChildTable> PgChildWriter<'c, C> {
    pub fn new(conn: &'c mut PgConnection, parent_id: RecordId, tenant: Tenant) -> Self {
        Self {
            conn,
            parent_id,
            tenant,
            _child: PhantomData,
        }
    }

    fn push_scope(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        builder
            .push(" AND ")
            .push(C::PARENT_COLUMN)
            .push(" = ")
            .push_bind(self.parent_id)
            .push(" AND organization_id = ")
            .push_bind(self.tenant.organization_id)
            .push(" AND business_unit_id = ")
            .push_bind(self.tenant.business_unit_id);
    }
}

#[async_trait]
impl<C: PgChildTable> ChildWriter<C> for PgChildWriter<'_, C> {
    async fn insert(&mut self, mut child: C) -> AppResult<C> {
        child.set_id(RecordId::new());

        let mut names = ColumnNames::default();
        child.bind_columns(&mut names);

        let mut builder = QueryBuilder::<Postgres>::new("INSERT INTO ");
        builder
            .push(C::TABLE)
            .push(" (id, organization_id, business_unit_id, ")
            .push(C::PARENT_COLUMN)
            .push(", ")
            .push(names.names.join(", "))
            .push(") VALUES (")
            .push_bind(child.id())
            .push(", ")
            .push_bind(self.tenant.organization_id)
            .push(", ")
            .push_bind(self.tenant.business_unit_id)
            .push(", ")
            .push_bind(self.parent_id)
            .push(", ");
        child.bind_columns(&mut BoundColumns::values(&mut builder));
        builder.push(") RETURNING *");

        builder
            .build_query_as::<C>()
            .fetch_one(&mut *self.conn)
            .await
            .map_err(|e| database_error(&format!("Failed to insert into {}", C::TABLE), e))
    }

    async fn update(&mut self, child: C) -> AppResult<C> {
        let id = child
            .id()
            .ok_or_else(|| AppError::internal("Child update without an id"))?;

        let mut builder = QueryBuilder::<Postgres>::new("UPDATE ");
        builder.push(C::TABLE).push(" SET ");
        child.bind_columns(&mut BoundColumns::assignments(&mut builder));
        builder.push(" WHERE id = ").push_bind(id);
        self.push_scope(&mut builder);
        builder.push(" RETURNING *");

        builder
            .build_query_as::<C>()
            .fetch_optional(&mut *self.conn)
            .await
            .map_err(|e| database_error(&format!("Failed to update {}", C::TABLE), e))?
            .ok_or_else(|| AppError::not_found(format!("Child record {id} not found in {}", C::TABLE)))
    }

    async fn delete(&mut self, id: RecordId) -> AppResult<()> {
        let mut builder = QueryBuilder::<Postgres>::new("DELETE FROM ");
        builder.push(C::TABLE).push(" WHERE id = ").push_bind(id);
        self.push_scope(&mut builder);

        builder
            .build()
            .execute(&mut *self.conn)
            .await
            .map_err(|e| database_error(&format!("Failed to delete from {}", C::TABLE), e))?;
        Ok(())
    }
}
