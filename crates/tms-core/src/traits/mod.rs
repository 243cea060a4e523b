//! Framework seams implemented by the storage, permission and domain
//! crates.

pub mod children;
pub mod permission;
pub mod record;
pub mod repository;
pub mod uniqueness;

pub use children::{ChildWriter, ReconcilePlan, plan_children, reconcile_children};
pub use permission::PermissionService;
pub use record::{ChildCollection, ChildRecord, DomainRecord, UniqueField};
pub use repository::VersionedRepository;
pub use uniqueness::{
    UniqueFieldValue, UniquenessChecker, UniquenessOperation, UniquenessSpec, duplicate_errors,
};
