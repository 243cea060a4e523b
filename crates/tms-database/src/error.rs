//! Mapping of sqlx failures into [`AppError`].

use tms_core::traits::DomainRecord;
use tms_core::traits::uniqueness::scalar_text;
use tms_core::{AppError, ErrorCode, ErrorKind, MultiError};

/// PostgreSQL SQLSTATE for `unique_violation`.
pub const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL SQLSTATE for `serialization_failure`.
pub const SERIALIZATION_FAILURE: &str = "40001";

/// Wrap a sqlx error as a database error.
pub fn database_error(message: &str, err: sqlx::Error) -> AppError {
    AppError::with_source(ErrorKind::Database, message.to_string(), err)
}

/// Name of the violated unique constraint, if `err` is a unique violation.
pub fn unique_violation(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            db_err.constraint().map(str::to_string)
        }
        _ => None,
    }
}

/// Whether `err` is a repeatable-read transaction losing to a concurrent
/// commit on the same row.
pub fn is_serialization_failure(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(SERIALIZATION_FAILURE))
}

/// Translate a failed write of `record`.
///
/// A violation of one of the record's unique indexes is reported as the
/// same field error the uniqueness check would have produced; everything
/// else is a database error.
pub fn write_error<R: DomainRecord>(message: &str, err: sqlx::Error, record: &R) -> AppError {
    if let Some(constraint) = unique_violation(&err) {
        if let Some(error) = duplicate_error(record, &constraint) {
            return error;
        }
    }
    database_error(message, err)
}

/// Field error for the unique field of `R` backed by `constraint`.
pub fn duplicate_error<R: DomainRecord>(record: &R, constraint: &str) -> Option<AppError> {
    let field = R::UNIQUE_FIELDS
        .iter()
        .find(|f| f.constraint_name(R::TABLE) == constraint)?;
    let value = serde_json::to_value(record)
        .ok()
        .and_then(|json| json.get(field.field).and_then(scalar_text))
        .unwrap_or_default();

    let mut errors = MultiError::new();
    errors.add(field.field, ErrorCode::Duplicate, field.render(&value));
    Some(AppError::invalid(errors))
}
