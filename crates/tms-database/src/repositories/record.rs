//! Generic PostgreSQL repository for versioned domain records.

use std::marker::PhantomData;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::debug;

use tms_core::traits::record::{next_timestamp, truncate_micros};
use tms_core::traits::{UniquenessOperation, UniquenessSpec, VersionedRepository, duplicate_errors};
use tms_core::types::{
    FilterField, FilterOp, FilterValue, GetOptions, ListOptions, ListResult, RecordId,
    TenantContext,
};
use tms_core::{AppError, AppResult, ResultExt};

use crate::error::{database_error, is_serialization_failure, write_error};
use crate::repositories::uniqueness::conflicts_on;
use crate::tables::{BoundColumns, ColumnNames, PgTable, column_name};
use crate::transaction::with_transaction;

/// Tenant-scoped, optimistically locked storage of `R` in `R::TABLE`.
pub struct PgRecordRepository<R> {
    pool: PgPool,
    single_connection: bool,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for PgRecordRepository<R> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            single_connection: self.single_connection,
            _record: PhantomData,
        }
    }
}

impl<R: PgTable> PgRecordRepository<R> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            single_connection: false,
            _record: PhantomData,
        }
    }

    /// Run every write at `REPEATABLE READ` and check the unique fields on
    /// the write's connection before touching the row.
    pub fn with_single_connection(mut self, enabled: bool) -> Self {
        self.single_connection = enabled;
        self
    }

    pub fn single_connection(&self) -> bool {
        self.single_connection
    }

    async fn fetch_page(&self, tenant: &TenantContext, opts: &ListOptions) -> AppResult<ListResult<R>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM ");
        count.push(R::TABLE);
        push_conditions::<R>(&mut count, tenant, opts)?;
        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| database_error(&format!("Failed to count {}", R::TABLE), e))?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT * FROM ");
        select.push(R::TABLE);
        push_conditions::<R>(&mut select, tenant, opts)?;
        push_order::<R>(&mut select, opts)?;
        select
            .push(" LIMIT ")
            .push_bind(opts.limit() as i64)
            .push(" OFFSET ")
            .push_bind(opts.offset() as i64);

        let mut items = select
            .build_query_as::<R>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| database_error(&format!("Failed to list {}", R::TABLE), e))?;

        if opts.expand_relations && !items.is_empty() {
            let mut conn = self.acquire().await?;
            for item in &mut items {
                item.load_relations(&mut *conn).await?;
            }
        }

        Ok(ListResult::new(items, total.max(0) as u64))
    }

    async fn fetch_one(&self, tenant: &TenantContext, opts: &GetOptions) -> AppResult<R> {
        let sql = format!(
            "SELECT * FROM {} WHERE id = $1 AND organization_id = $2 AND business_unit_id = $3",
            R::TABLE
        );
        let mut conn = self.acquire().await?;
        let mut record = sqlx::query_as::<_, R>(&sql)
            .bind(opts.id)
            .bind(tenant.organization_id)
            .bind(tenant.business_unit_id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| database_error(&format!("Failed to find {}", R::MODEL_NAME), e))?
            .ok_or_else(|| AppError::record_not_found(R::MODEL_NAME))?;

        if opts.expand_relations {
            record.load_relations(&mut *conn).await?;
        }
        Ok(record)
    }

    async fn acquire(&self) -> AppResult<sqlx::pool::PoolConnection<Postgres>> {
        self.pool
            .acquire()
            .await
            .map_err(|e| database_error("Failed to acquire connection", e))
    }
}

#[async_trait]
impl<R: PgTable> VersionedRepository<R> for PgRecordRepository<R> {
    async fn list(&self, tenant: &TenantContext, opts: &ListOptions) -> AppResult<ListResult<R>> {
        self.fetch_page(tenant, opts)
            .await
            .context(&format!("list {}", R::TABLE))
    }

    async fn get_by_id(&self, tenant: &TenantContext, opts: &GetOptions) -> AppResult<R> {
        self.fetch_one(tenant, opts)
            .await
            .context(&format!("get {}", R::MODEL_NAME))
    }

    async fn create(&self, mut record: R) -> AppResult<R> {
        let now = truncate_micros(Utc::now());
        record.set_id(RecordId::new());
        record.set_version(1);
        record.set_timestamps(now, now);

        let name = format!("create {}", R::MODEL_NAME);
        let tx_name = format!("{} transaction", R::MODEL_NAME);
        let single_connection = self.single_connection;
        with_transaction(&self.pool, &tx_name, move |conn| {
            Box::pin(async move {
                if single_connection {
                    repeatable_read(conn).await?;
                    ensure_unique(conn, &record, UniquenessOperation::Create).await?;
                }
                insert_row(conn, &record).await?;
                record.save_relations(conn).await?;
                Ok(record)
            })
        })
        .await
        .context(&name)
    }

    async fn update(&self, mut record: R) -> AppResult<R> {
        let id = record
            .id()
            .ok_or_else(|| AppError::validation(format!("{} id is required", R::MODEL_NAME)))?;

        let name = format!("update {}", R::MODEL_NAME);
        let tx_name = format!("{} transaction", R::MODEL_NAME);
        let single_connection = self.single_connection;
        with_transaction(&self.pool, &tx_name, move |conn| {
            Box::pin(async move {
                if single_connection {
                    repeatable_read(conn).await?;
                }
                let (stored_version, created_at, stored_updated_at) =
                    lock_row::<R>(conn, id, &record).await?;
                if stored_version != record.version() {
                    debug!(
                        table = R::TABLE,
                        %id,
                        stored_version,
                        submitted_version = record.version(),
                        "Version mismatch"
                    );
                    return Err(AppError::version_conflict(R::PRIMARY_FIELD));
                }

                if single_connection {
                    ensure_unique(conn, &record, UniquenessOperation::Update).await?;
                }

                let next_version = stored_version + 1;
                let updated_at = next_timestamp(stored_updated_at);
                update_row(conn, id, &record, next_version, updated_at).await?;

                record.set_version(next_version);
                record.set_timestamps(created_at, updated_at);
                record.save_relations(conn).await?;
                Ok(record)
            })
        })
        .await
        .context(&name)
    }
}

async fn insert_row<R: PgTable>(conn: &mut PgConnection, record: &R) -> AppResult<()> {
    let tenant = record.tenant();
    let mut names = ColumnNames::default();
    record.bind_columns(&mut names);

    let mut builder = QueryBuilder::<Postgres>::new("INSERT INTO ");
    builder
        .push(R::TABLE)
        .push(" (id, organization_id, business_unit_id, version, created_at, updated_at, ")
        .push(names.names.join(", "))
        .push(") VALUES (")
        .push_bind(record.id())
        .push(", ")
        .push_bind(tenant.organization_id)
        .push(", ")
        .push_bind(tenant.business_unit_id)
        .push(", ")
        .push_bind(record.version())
        .push(", ")
        .push_bind(record.created_at())
        .push(", ")
        .push_bind(record.updated_at())
        .push(", ");
    record.bind_columns(&mut BoundColumns::values(&mut builder));
    builder.push(")");

    builder
        .build()
        .execute(&mut *conn)
        .await
        .map_err(|e| write_error(&format!("Failed to insert {}", R::MODEL_NAME), e, record))?;
    Ok(())
}

/// Must be the first statement of the transaction.
async fn repeatable_read(conn: &mut PgConnection) -> AppResult<()> {
    sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
        .execute(&mut *conn)
        .await
        .map(|_| ())
        .map_err(|e| database_error("Failed to set transaction isolation", e))
}

/// Uniqueness check on the write's own connection.
async fn ensure_unique<R: PgTable>(
    conn: &mut PgConnection,
    record: &R,
    operation: UniquenessOperation,
) -> AppResult<()> {
    let spec = UniquenessSpec::for_record(record, operation)?;
    let errors = duplicate_errors(&conflicts_on(&mut *conn, &spec).await?);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::invalid(errors))
    }
}

async fn lock_row<R: PgTable>(
    conn: &mut PgConnection,
    id: RecordId,
    record: &R,
) -> AppResult<(i64, DateTime<Utc>, DateTime<Utc>)> {
    let tenant = record.tenant();
    let sql = format!(
        "SELECT version, created_at, updated_at FROM {} \
         WHERE id = $1 AND organization_id = $2 AND business_unit_id = $3 FOR UPDATE",
        R::TABLE
    );
    sqlx::query_as::<_, (i64, DateTime<Utc>, DateTime<Utc>)>(&sql)
        .bind(id)
        .bind(tenant.organization_id)
        .bind(tenant.business_unit_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| {
            if is_serialization_failure(&e) {
                AppError::version_conflict(R::PRIMARY_FIELD)
            } else {
                database_error(&format!("Failed to lock {}", R::MODEL_NAME), e)
            }
        })?
        .ok_or_else(|| AppError::record_not_found(R::MODEL_NAME))
}

async fn update_row<R: PgTable>(
    conn: &mut PgConnection,
    id: RecordId,
    record: &R,
    next_version: i64,
    updated_at: DateTime<Utc>,
) -> AppResult<()> {
    let tenant = record.tenant();
    let mut builder = QueryBuilder::<Postgres>::new("UPDATE ");
    builder
        .push(R::TABLE)
        .push(" SET version = ")
        .push_bind(next_version)
        .push(", updated_at = ")
        .push_bind(updated_at)
        .push(", ");
    record.bind_columns(&mut BoundColumns::assignments(&mut builder));
    builder
        .push(" WHERE id = ")
        .push_bind(id)
        .push(" AND organization_id = ")
        .push_bind(tenant.organization_id)
        .push(" AND business_unit_id = ")
        .push_bind(tenant.business_unit_id)
        .push(" AND version = ")
        .push_bind(record.version());

    let result = builder
        .build()
        .execute(&mut *conn)
        .await
        .map_err(|e| write_error(&format!("Failed to update {}", R::MODEL_NAME), e, record))?;

    if result.rows_affected() == 0 {
        return Err(AppError::version_conflict(R::PRIMARY_FIELD));
    }
    Ok(())
}

/// Tenant predicate, free-text search and structured filters.
fn push_conditions<R: PgTable>(
    builder: &mut QueryBuilder<'_, Postgres>,
    tenant: &TenantContext,
    opts: &ListOptions,
) -> AppResult<()> {
    builder
        .push(" WHERE organization_id = ")
        .push_bind(tenant.organization_id)
        .push(" AND business_unit_id = ")
        .push_bind(tenant.business_unit_id);

    if let Some(term) = opts.search_term() {
        if !R::SEARCH_FIELDS.is_empty() {
            let pattern = format!("%{term}%");
            builder.push(" AND (");
            for (i, field) in R::SEARCH_FIELDS.iter().enumerate() {
                if i > 0 {
                    builder.push(" OR ");
                }
                builder
                    .push("CAST(")
                    .push(column_name(field)?)
                    .push(" AS TEXT) ILIKE ")
                    .push_bind(pattern.clone());
            }
            builder.push(")");
        }
    }

    for filter in &opts.filters {
        builder.push(" AND ");
        push_filter(builder, filter)?;
    }
    Ok(())
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &FilterField) -> AppResult<()> {
    let column = column_name(&filter.field)?;
    match (filter.op, &filter.value) {
        (FilterOp::IsNull | FilterOp::IsNotNull, _) => {
            builder.push(column).push(" ").push(filter.op.as_sql());
        }
        (FilterOp::In, FilterValue::StringList(values)) => {
            builder
                .push("CAST(")
                .push(column)
                .push(" AS TEXT) = ANY(")
                .push_bind(values.clone())
                .push(")");
        }
        (FilterOp::In, _) | (_, FilterValue::StringList(_) | FilterValue::Null) => {
            return Err(AppError::validation(format!(
                "Invalid value for filter on '{}'",
                filter.field
            )));
        }
        (op, FilterValue::String(s)) => {
            builder
                .push("CAST(")
                .push(column)
                .push(" AS TEXT) ")
                .push(op.as_sql())
                .push(" ")
                .push_bind(s.clone());
        }
        (FilterOp::Like | FilterOp::ILike, _) => {
            return Err(AppError::validation(format!(
                "Pattern filter on '{}' requires a string",
                filter.field
            )));
        }
        (op, FilterValue::Integer(i)) => {
            builder.push(column).push(" ").push(op.as_sql()).push(" ").push_bind(*i);
        }
        (op, FilterValue::Float(f)) => {
            builder.push(column).push(" ").push(op.as_sql()).push(" ").push_bind(*f);
        }
        (op, FilterValue::Boolean(b)) => {
            builder.push(column).push(" ").push(op.as_sql()).push(" ").push_bind(*b);
        }
    }
    Ok(())
}

/// Requested sort keys, else the primary field; `created_at` and `id`
/// break ties so paging is stable.
fn push_order<R: PgTable>(builder: &mut QueryBuilder<'_, Postgres>, opts: &ListOptions) -> AppResult<()> {
    builder.push(" ORDER BY ");
    if opts.sort.is_empty() {
        builder.push(column_name(R::PRIMARY_FIELD)?).push(" ASC");
    } else {
        for (i, sort) in opts.sort.iter().enumerate() {
            if i > 0 {
                builder.push(", ");
            }
            builder
                .push(column_name(&sort.field)?)
                .push(" ")
                .push(sort.direction.as_sql());
        }
    }
    builder.push(", created_at ASC, id ASC");
    Ok(())
}
