//! Field checks shared by record self-validation.
//!
//! Declarative constraints (lengths, formats, ranges) are expressed with
//! `validator` derives on the records; [`collect_violations`] folds their
//! result into a [`MultiError`] using the records' JSON field paths.

use std::borrow::Cow;

use tms_core::{ErrorCode, MultiError};
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

/// Record a `Required` error when `value` is blank.
pub fn require_text(value: &str, field: &str, message: &str, errors: &mut MultiError) -> bool {
    if value.trim().is_empty() {
        errors.add(field, ErrorCode::Required, message);
        return false;
    }
    true
}

/// Record a `Required` error when `value` is `None`.
pub fn require_some<T>(value: &Option<T>, field: &str, message: &str, errors: &mut MultiError) -> bool {
    if value.is_none() {
        errors.add(field, ErrorCode::Required, message);
        return false;
    }
    true
}

/// Record an `Invalid` error when `value` is not one of `allowed`.
pub fn one_of(value: &str, allowed: &[&str], field: &str, errors: &mut MultiError) -> bool {
    if !allowed.contains(&value) {
        errors.add(
            field,
            ErrorCode::Invalid,
            format!("Must be one of: {}", allowed.join(", ")),
        );
        return false;
    }
    true
}

/// Fold the outcome of a `validator` run into `errors`.
pub fn collect_violations(result: Result<(), ValidationErrors>, errors: &mut MultiError) {
    if let Err(violations) = result {
        push_violations(&violations, "", errors);
    }
}

fn push_violations(violations: &ValidationErrors, prefix: &str, out: &mut MultiError) {
    let mut fields: Vec<_> = violations.errors().iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    for (name, kind) in fields {
        let path = join_path(prefix, &camel_case(name));
        match kind {
            ValidationErrorsKind::Field(list) => {
                for error in list {
                    out.add(path.clone(), code_for(error), message_for(error, &path));
                }
            }
            ValidationErrorsKind::Struct(inner) => push_violations(inner, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    push_violations(inner, &format!("{path}[{index}]"), out);
                }
            }
        }
    }
}

fn code_for(error: &ValidationError) -> ErrorCode {
    match error.code.as_ref() {
        "required" => ErrorCode::Required,
        "length" => ErrorCode::InvalidLength,
        "email" | "url" | "regex" | "contains" => ErrorCode::InvalidFormat,
        _ => ErrorCode::Invalid,
    }
}

fn message_for(error: &ValidationError, path: &str) -> String {
    match &error.message {
        Some(Cow::Borrowed(m)) => (*m).to_string(),
        Some(Cow::Owned(m)) => m.clone(),
        None => format!("{path} is invalid"),
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

/// `address_line_1` → `addressLine1`.
pub fn camel_case(snake: &str) -> String {
    let mut out = String::with_capacity(snake.len());
    let mut upper = false;
    for c in snake.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}
