//! PostgreSQL repository implementations.

pub mod audit;
pub mod children;
pub mod permission;
pub mod record;
pub mod uniqueness;

pub use audit::PgAuditLogRepository;
pub use children::PgChildWriter;
pub use permission::PgPermissionGrantRepository;
pub use record::PgRecordRepository;
pub use uniqueness::PgUniquenessChecker;
