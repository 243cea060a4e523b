//! # tms-database
//!
//! Storage for the TMS service framework: PostgreSQL connection
//! management, migrations and repositories, plus an in-memory backend
//! with the same observable behavior.

pub mod connection;
pub mod error;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;
pub mod tables;
pub mod transaction;

pub use connection::DatabasePool;
pub use memory::MemoryStore;
pub use store::{AuditQuery, AuditRepository, PermissionGrantStore};
pub use tables::PgTable;
pub use transaction::{Transactional, run_scoped, with_transaction};
