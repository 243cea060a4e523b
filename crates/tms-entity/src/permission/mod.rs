//! Tenant-scoped permission grants.

pub mod model;

pub use model::{PermissionGrant, PermissionManifest, TenantRole};
