//! # tms-auth
//!
//! Authorization for the TMS service framework.
//!
//! ## Modules
//!
//! - `rbac` — tenant roles, per-role default grants and the
//!   [`PolicyPermissionService`] that answers permission checks from the
//!   grants stored for each user and tenant

pub mod rbac;

pub use rbac::{PolicyPermissionService, RolePolicies};
