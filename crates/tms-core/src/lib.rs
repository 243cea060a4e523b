//! # tms-core
//!
//! Core crate of the TMS service framework. Contains the framework traits
//! (records, repositories, permissions, uniqueness), configuration
//! schemas, typed identifiers, tenant and request context, list options,
//! and the unified error system.
//!
//! This crate has **no** internal dependencies on other TMS crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;
pub mod validation;

pub use error::{AppError, ErrorKind, ResultExt};
pub use result::AppResult;
pub use validation::{ErrorCode, FieldError, MultiError, ValidationContext};
