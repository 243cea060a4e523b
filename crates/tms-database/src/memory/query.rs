//! List-query evaluation over JSON documents.

use std::cmp::Ordering;

use serde_json::Value;

use tms_core::traits::record::{CREATED_AT_FIELD, ID_FIELD};
use tms_core::types::filter::like_matches;
use tms_core::types::{FilterField, FilterOp, FilterValue, SortDirection, SortField};
use tms_core::{AppError, AppResult};

use super::json_text;
use crate::tables::column_name;

/// Whether any of `fields` contains `term`, ignoring case.
pub fn search_matches(row: &Value, fields: &[&str], term: &str) -> bool {
    let pattern = format!("%{term}%");
    fields.iter().any(|field| {
        row.get(*field)
            .and_then(json_text)
            .is_some_and(|text| like_matches(&text, &pattern, true))
    })
}

/// Reject filters the PostgreSQL backend would reject.
pub fn check_filter(filter: &FilterField) -> AppResult<()> {
    column_name(&filter.field)?;
    let valid = match (filter.op, &filter.value) {
        (FilterOp::IsNull | FilterOp::IsNotNull, _) => true,
        (FilterOp::In, value) => matches!(value, FilterValue::StringList(_)),
        (FilterOp::Like | FilterOp::ILike, value) => matches!(value, FilterValue::String(_)),
        (_, FilterValue::StringList(_) | FilterValue::Null) => false,
        _ => true,
    };
    if valid {
        Ok(())
    } else {
        Err(AppError::validation(format!(
            "Invalid value for filter on '{}'",
            filter.field
        )))
    }
}

/// Evaluate one filter. Missing fields behave like SQL `NULL`.
pub fn filter_matches(row: &Value, filter: &FilterField) -> bool {
    let value = row.get(&filter.field).unwrap_or(&Value::Null);
    match filter.op {
        FilterOp::IsNull => value.is_null(),
        FilterOp::IsNotNull => !value.is_null(),
        FilterOp::In => match (&filter.value, json_text(value)) {
            (FilterValue::StringList(values), Some(text)) => values.contains(&text),
            _ => false,
        },
        FilterOp::Like | FilterOp::ILike => match (&filter.value, json_text(value)) {
            (FilterValue::String(pattern), Some(text)) => {
                like_matches(&text, pattern, filter.op == FilterOp::ILike)
            }
            _ => false,
        },
        op => match compare_to_filter(value, &filter.value) {
            Some(ordering) => match op {
                FilterOp::Eq => ordering == Ordering::Equal,
                FilterOp::Ne => ordering != Ordering::Equal,
                FilterOp::Gt => ordering == Ordering::Greater,
                FilterOp::Gte => ordering != Ordering::Less,
                FilterOp::Lt => ordering == Ordering::Less,
                FilterOp::Lte => ordering != Ordering::Greater,
                _ => false,
            },
            None => false,
        },
    }
}

fn compare_to_filter(value: &Value, filter: &FilterValue) -> Option<Ordering> {
    match filter {
        FilterValue::String(s) => json_text(value).map(|text| text.as_str().cmp(s.as_str())),
        FilterValue::Integer(i) => value.as_f64()?.partial_cmp(&(*i as f64)),
        FilterValue::Float(f) => value.as_f64()?.partial_cmp(f),
        FilterValue::Boolean(b) => value.as_bool().map(|v| v.cmp(b)),
        FilterValue::StringList(_) | FilterValue::Null => None,
    }
}

/// Order rows by `sort`, else `primary` ascending; `createdAt` then `id`
/// break ties. `NULL`s sort last ascending and first descending.
pub fn compare_rows(a: &Value, b: &Value, sort: &[SortField], primary: &str) -> Ordering {
    let default = [SortField::asc(primary)];
    let keys = if sort.is_empty() { &default[..] } else { sort };

    for key in keys {
        let ordering = compare_values(
            a.get(&key.field).unwrap_or(&Value::Null),
            b.get(&key.field).unwrap_or(&Value::Null),
        );
        let ordering = match key.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    for field in [CREATED_AT_FIELD, ID_FIELD] {
        let ordering = compare_values(
            a.get(field).unwrap_or(&Value::Null),
            b.get(field).unwrap_or(&Value::Null),
        );
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .zip(y.as_f64())
            .and_then(|(x, y)| x.partial_cmp(&y))
            .unwrap_or(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => json_text(a).cmp(&json_text(b)),
    }
}
