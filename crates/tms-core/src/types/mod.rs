//! Core type definitions used across the workspace.

pub mod filter;
pub mod id;
pub mod pagination;
pub mod permission;
pub mod sorting;
pub mod tenant;

pub use filter::{FilterField, FilterOp, FilterValue};
pub use id::*;
pub use pagination::{GetOptions, ListOptions, ListResult, SelectOption};
pub use permission::{Action, PermissionCheck, PermissionResult, Resource};
pub use sorting::{SortDirection, SortField};
pub use tenant::{RequestContext, Tenant, TenantContext};
