//! # tms-entity
//!
//! Domain records of the transportation-management system, plus the
//! audit entry and permission grant models. Every record implements
//! [`DomainRecord`](tms_core::traits::DomainRecord) so the generic service
//! template can list, read, create and update it; every stored struct
//! additionally derives `sqlx::FromRow`.

mod macros;

pub mod audit;
pub mod checks;
pub mod commodity;
pub mod equipment;
pub mod location;
pub mod permission;
pub mod status;
pub mod tractor;
pub mod worker;

pub use commodity::Commodity;
pub use equipment::{EquipmentClass, EquipmentStatus, EquipmentType};
pub use location::{Location, LocationComment, LocationContact};
pub use status::Status;
pub use tractor::{Tractor, TractorAssignment};
pub use worker::{Worker, WorkerType};
