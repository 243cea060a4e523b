//! Role-based access control enforcement.

pub mod enforcer;
pub mod policies;

pub use enforcer::PolicyPermissionService;
pub use policies::RolePolicies;
