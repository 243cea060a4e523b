//! Unified application error types for the TMS service framework.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. Validation-shaped failures carry a
//! [`MultiError`] so callers can render per-field messages.

use std::fmt;
use thiserror::Error;

use crate::validation::{ErrorCode, MultiError};

/// Message attached to the primary field when an update loses an
/// optimistic-concurrency race.
pub const VERSION_MISMATCH_MESSAGE: &str =
    "This record has been updated by another user. Please refresh and try again";

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The requested record was not found within the caller's tenant.
    NotFound,
    /// The caller does not have permission to perform the action.
    Authorization,
    /// Input validation failed. Carries a [`MultiError`].
    Validation,
    /// The record was modified by someone else since it was read.
    VersionConflict,
    /// A database error occurred.
    Database,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// A configuration error occurred.
    Configuration,
    /// The request deadline elapsed before the operation finished.
    Timeout,
    /// An internal error occurred.
    Internal,
}

impl ErrorKind {
    /// Whether errors of this kind describe a failure of the system rather
    /// than of the caller's input.
    pub fn is_system(&self) -> bool {
        matches!(
            self,
            Self::Database | Self::Serialization | Self::Configuration | Self::Internal
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Authorization => write!(f, "AUTHORIZATION"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::VersionConflict => write!(f, "VERSION_CONFLICT"),
            Self::Database => write!(f, "DATABASE"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Timeout => write!(f, "TIMEOUT"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error.
///
/// All crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Field-level details for validation-shaped errors.
    pub fields: Option<MultiError>,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            fields: None,
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            fields: None,
            source: Some(Box::new(source)),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Not-found error for a record of `model` that is missing or owned by
    /// another tenant. The two cases are indistinguishable to the caller.
    pub fn record_not_found(model: &str) -> Self {
        let mut chars = model.chars();
        let model = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
            None => String::new(),
        };
        Self::not_found(format!("{model} not found within your organization"))
    }

    /// Create an authorization error.
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authorization, message)
    }

    /// Create a validation error with a single message and no field details.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a validation error from accumulated field errors.
    pub fn invalid(errors: MultiError) -> Self {
        let message = errors
            .first()
            .map(|e| e.message.clone())
            .unwrap_or_else(|| "Validation failed".to_string());
        Self {
            kind: ErrorKind::Validation,
            message,
            fields: Some(errors),
            source: None,
        }
    }

    /// Create a version-conflict error reported on `field`.
    pub fn version_conflict(field: &str) -> Self {
        let mut errors = MultiError::new();
        errors.add(field, ErrorCode::VersionMismatch, VERSION_MISMATCH_MESSAGE);
        Self {
            kind: ErrorKind::VersionConflict,
            message: VERSION_MISMATCH_MESSAGE.to_string(),
            fields: Some(errors),
            source: None,
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    /// Prefix the message of a system error with `phrase`.
    ///
    /// User-facing kinds are returned untouched so their message stays
    /// renderable.
    pub fn context(mut self, phrase: &str) -> Self {
        if self.kind.is_system() {
            self.message = format!("{phrase}: {}", self.message);
        }
        self
    }

    /// Message suitable for showing to an end user.
    ///
    /// System errors are opaque; everything else surfaces its message.
    pub fn public_message(&self) -> &str {
        if self.kind.is_system() {
            "An internal error occurred"
        } else {
            &self.message
        }
    }

    /// Field-level details, if any.
    pub fn field_errors(&self) -> Option<&MultiError> {
        self.fields.as_ref()
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            fields: self.fields.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

/// Attach a context phrase to the error side of a result.
pub trait ResultExt<T> {
    /// See [`AppError::context`].
    fn context(self, phrase: &str) -> Result<T, AppError>;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, phrase: &str) -> Result<T, AppError> {
        self.map_err(|e| e.context(phrase))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_prefixes_system_errors_only() {
        let err = AppError::database("connection reset").context("update tractor");
        assert_eq!(err.message, "update tractor: connection reset");

        let err = AppError::not_found("Tractor not found").context("get tractor");
        assert_eq!(err.message, "Tractor not found");
    }

    #[test]
    fn test_record_not_found_message() {
        let err = AppError::record_not_found("equipment type");
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(err.message, "Equipment type not found within your organization");
    }

    #[test]
    fn test_public_message_hides_internals() {
        let err = AppError::database("relation \"tractors\" does not exist");
        assert_eq!(err.public_message(), "An internal error occurred");

        let err = AppError::authorization("You do not have permission to read tractors");
        assert_eq!(
            err.public_message(),
            "You do not have permission to read tractors"
        );
    }

    #[test]
    fn test_version_conflict_targets_field() {
        let err = AppError::version_conflict("code");
        assert_eq!(err.kind, ErrorKind::VersionConflict);
        let fields = err.field_errors().expect("fields");
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.errors()[0].field, "code");
        assert_eq!(fields.errors()[0].code, ErrorCode::VersionMismatch);
    }

    #[test]
    fn test_invalid_uses_first_message() {
        let mut errors = MultiError::new();
        errors.add("name", ErrorCode::Required, "Name is required");
        errors.add("code", ErrorCode::Required, "Code is required");
        let err = AppError::invalid(errors);
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.message, "Name is required");
        assert_eq!(err.to_string(), "VALIDATION: Name is required");
    }

    #[test]
    fn test_clone_keeps_fields() {
        let err = AppError::version_conflict("name");
        let cloned = err.clone();
        assert_eq!(cloned.fields, err.fields);
    }
}
