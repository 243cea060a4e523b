//! Field-level validation error accumulation and the validation context
//! handed to every rule.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::tenant::TenantContext;

/// Machine-readable reason attached to a [`FieldError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// A required value is missing.
    Required,
    /// The value is not acceptable.
    Invalid,
    /// The value is too short or too long.
    InvalidLength,
    /// The value does not match the expected format.
    InvalidFormat,
    /// Another record in the tenant already uses this value.
    Duplicate,
    /// The record changed since it was read.
    VersionMismatch,
    /// A referenced record does not exist or has the wrong shape.
    InvalidReference,
    /// A business rule rejected the value.
    BusinessRuleViolation,
    /// A rule failed for reasons unrelated to the input.
    SystemError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Required => "REQUIRED",
            Self::Invalid => "INVALID",
            Self::InvalidLength => "INVALID_LENGTH",
            Self::InvalidFormat => "INVALID_FORMAT",
            Self::Duplicate => "DUPLICATE",
            Self::VersionMismatch => "VERSION_MISMATCH",
            Self::InvalidReference => "INVALID_REFERENCE",
            Self::BusinessRuleViolation => "BUSINESS_RULE_VIOLATION",
            Self::SystemError => "SYSTEM_ERROR",
        };
        f.write_str(s)
    }
}

/// A single validation failure on one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Dotted path of the offending field (`comments[0].comment`).
    pub field: String,
    /// Reason code.
    pub code: ErrorCode,
    /// User-facing message.
    pub message: String,
}

/// Ordered collection of field errors. Empty means success.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiError {
    errors: Vec<FieldError>,
}

impl MultiError {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an error.
    pub fn add(&mut self, field: impl Into<String>, code: ErrorCode, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            code,
            message: message.into(),
        });
    }

    /// Append an error for an element of an indexed collection, e.g.
    /// `contacts[2].email`.
    pub fn add_at(
        &mut self,
        collection: &str,
        index: usize,
        field: &str,
        code: ErrorCode,
        message: impl Into<String>,
    ) {
        self.add(format!("{collection}[{index}].{field}"), code, message);
    }

    /// Move every error of `other` into `self`, prefixing field paths with
    /// `prefix` (joined by `.`).
    pub fn merge_prefixed(&mut self, prefix: &str, other: MultiError) {
        for mut error in other.errors {
            if !prefix.is_empty() {
                error.field = format!("{prefix}.{}", error.field);
            }
            self.errors.push(error);
        }
    }

    /// Move every error of `other` into `self` unchanged.
    pub fn merge(&mut self, other: MultiError) {
        self.errors.extend(other.errors);
    }

    /// Whether no error has been recorded.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of recorded errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// The first recorded error.
    pub fn first(&self) -> Option<&FieldError> {
        self.errors.first()
    }

    /// All recorded errors in insertion order.
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Errors recorded against `field`.
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FieldError> + 'a {
        self.errors.iter().filter(move |e| e.field == field)
    }

    /// Whether any error was recorded against `field`.
    pub fn has_field(&self, field: &str) -> bool {
        self.for_field(field).next().is_some()
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", error.field, error.message)?;
        }
        Ok(())
    }
}

/// Whether a validation run is for a create or an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// The record is about to be inserted.
    Create,
    /// The record is about to replace a stored one.
    Update,
}

/// Context passed to every validation rule.
#[derive(Debug, Clone)]
pub struct ValidationContext {
    /// Create or update.
    pub mode: ValidationMode,
    /// Tenant and actor the validation runs for.
    pub tenant: TenantContext,
}

impl ValidationContext {
    /// Context for validating a record about to be created.
    pub fn create(tenant: TenantContext) -> Self {
        Self {
            mode: ValidationMode::Create,
            tenant,
        }
    }

    /// Context for validating a record about to be updated.
    pub fn update(tenant: TenantContext) -> Self {
        Self {
            mode: ValidationMode::Update,
            tenant,
        }
    }

    pub fn is_create(&self) -> bool {
        self.mode == ValidationMode::Create
    }

    pub fn is_update(&self) -> bool {
        self.mode == ValidationMode::Update
    }
}
