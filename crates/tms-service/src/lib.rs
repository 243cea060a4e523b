//! # tms-service
//!
//! Service layer of the TMS framework.
//!
//! ## Modules
//!
//! - `validation` — staged rule engine and the rules every record gets
//! - `audit` — JSON differ, sensitive-field masking, audit service
//! - `record` — the generic list/get/create/update service template
//! - `tractor` — tractor cross-entity rules and the assignment lookup
//! - `catalog` — repository and service wiring

pub mod audit;
pub mod catalog;
pub mod permission;
pub mod record;
pub mod tractor;
pub mod validation;

pub use audit::AuditService;
pub use catalog::{Repositories, ServiceCatalog};
pub use record::RecordService;
pub use validation::{RecordValidator, ValidationEngine};
