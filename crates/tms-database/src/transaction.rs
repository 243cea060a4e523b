//! Scoped transactions.

use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tracing::{error, warn};

use tms_core::{AppError, AppResult};

use crate::error::database_error;
use crate::memory::{MemoryTransaction, Tables};

/// A unit of work that ends in a commit or a rollback.
#[async_trait]
pub trait Transactional: Send + Sized {
    /// What the body of the transaction writes through.
    type Target: ?Sized + Send;

    fn target(&mut self) -> &mut Self::Target;

    async fn commit(self) -> AppResult<()>;

    async fn rollback(self) -> AppResult<()>;
}

#[async_trait]
impl Transactional for Transaction<'static, Postgres> {
    type Target = PgConnection;

    fn target(&mut self) -> &mut PgConnection {
        &mut **self
    }

    async fn commit(self) -> AppResult<()> {
        Transaction::commit(self)
            .await
            .map_err(|e| database_error("Failed to commit transaction", e))
    }

    async fn rollback(self) -> AppResult<()> {
        Transaction::rollback(self)
            .await
            .map_err(|e| database_error("Failed to roll back transaction", e))
    }
}

#[async_trait]
impl<'a> Transactional for MemoryTransaction<'a> {
    type Target = Tables;

    fn target(&mut self) -> &mut Tables {
        self.tables_mut()
    }

    async fn commit(self) -> AppResult<()> {
        MemoryTransaction::commit(self).await;
        Ok(())
    }

    async fn rollback(self) -> AppResult<()> {
        drop(self);
        Ok(())
    }
}

/// Run `op` inside the already started transaction `tx`.
///
/// Commits when `op` returns `Ok`, rolls back when it returns `Err` or
/// panics. A panic is reported as an internal error instead of unwinding
/// through the caller.
pub async fn run_scoped<X, T, F>(mut tx: X, name: &str, op: F) -> AppResult<T>
where
    X: Transactional,
    T: Send,
    F: for<'c> FnOnce(&'c mut X::Target) -> BoxFuture<'c, AppResult<T>> + Send,
{
    let outcome = AssertUnwindSafe(op(tx.target())).catch_unwind().await;

    match outcome {
        Ok(Ok(value)) => {
            tx.commit().await?;
            Ok(value)
        }
        Ok(Err(err)) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(transaction = name, error = %rollback_err, "Rollback failed");
            }
            Err(err)
        }
        Err(_) => {
            error!(transaction = name, "Transaction body panicked, rolling back");
            if let Err(rollback_err) = tx.rollback().await {
                warn!(transaction = name, error = %rollback_err, "Rollback failed");
            }
            Err(AppError::internal(format!("{name} aborted unexpectedly")))
        }
    }
}

/// Run `op` inside one database transaction. See [`run_scoped`].
///
/// Dropping the returned future before it completes rolls the transaction
/// back as well.
pub async fn with_transaction<T, F>(pool: &PgPool, name: &str, op: F) -> AppResult<T>
where
    T: Send,
    F: for<'c> FnOnce(&'c mut PgConnection) -> BoxFuture<'c, AppResult<T>> + Send,
{
    let tx = pool
        .begin()
        .await
        .map_err(|e| database_error("Failed to begin transaction", e))?;
    run_scoped(tx, name, op).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use serde_json::json;
    use tms_core::ErrorKind;

    #[tokio::test]
    async fn test_panicking_body_commits_nothing() {
        let store = MemoryStore::new();

        let result = run_scoped(store.begin().await, "import rows", |tables: &mut Tables| {
            Box::pin(async move {
                let rows = tables.entry("rows").or_default();
                rows.push(json!({"id": 1}));
                if rows.len() == 1 {
                    panic!("row importer crashed");
                }
                Ok::<_, AppError>(rows.len())
            })
        })
        .await;

        let err = result.expect_err("panic surfaces as an error");
        assert_eq!(err.kind, ErrorKind::Internal);
        assert_eq!(err.message, "import rows aborted unexpectedly");
        assert_eq!(store.row_count("rows").await, 0);
    }

    #[tokio::test]
    async fn test_failed_body_commits_nothing() {
        let store = MemoryStore::new();

        let result = run_scoped(store.begin().await, "import rows", |tables: &mut Tables| {
            Box::pin(async move {
                tables.entry("rows").or_default().push(json!({"id": 1}));
                Err::<(), _>(AppError::validation("bad row"))
            })
        })
        .await;

        assert_eq!(result.expect_err("failed").kind, ErrorKind::Validation);
        assert_eq!(store.row_count("rows").await, 0);
    }

    #[tokio::test]
    async fn test_successful_body_commits() {
        let store = MemoryStore::new();

        let written = run_scoped(store.begin().await, "import rows", |tables: &mut Tables| {
            Box::pin(async move {
                tables.entry("rows").or_default().push(json!({"id": 1}));
                Ok::<_, AppError>(1)
            })
        })
        .await
        .expect("committed");

        assert_eq!(written, 1);
        assert_eq!(store.row_count("rows").await, 1);
    }
}
