//! Structured filters for list queries.
//!
//! Field names are the record's JSON (camelCase) names; each store maps
//! them onto its own representation and rejects unknown fields.

use serde::{Deserialize, Serialize};

/// Filter comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Case-sensitive `LIKE` pattern (`%` and `_` wildcards).
    Like,
    /// Case-insensitive `LIKE` pattern.
    ILike,
    /// Membership in a list of values.
    In,
    IsNull,
    IsNotNull,
}

impl FilterOp {
    /// SQL operator text for binary comparisons.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Like => "LIKE",
            Self::ILike => "ILIKE",
            Self::In => "IN",
            Self::IsNull => "IS NULL",
            Self::IsNotNull => "IS NOT NULL",
        }
    }
}

/// A dynamic filter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    /// A list of values for the `In` operator.
    StringList(Vec<String>),
    /// No value (for `IsNull`, `IsNotNull`).
    Null,
}

impl FilterValue {
    /// Textual form of a scalar value.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::String(s) => Some(s.clone()),
            Self::Integer(i) => Some(i.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::Boolean(b) => Some(b.to_string()),
            Self::StringList(_) | Self::Null => None,
        }
    }
}

/// A single filter condition on a named field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterField {
    pub field: String,
    pub op: FilterOp,
    pub value: FilterValue,
}

impl FilterField {
    pub fn new(field: impl Into<String>, op: FilterOp, value: FilterValue) -> Self {
        Self {
            field: field.into(),
            op,
            value,
        }
    }

    /// Shorthand for an equality filter.
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, FilterOp::Eq, FilterValue::String(value.into()))
    }

    /// Shorthand for an inequality filter.
    pub fn ne(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, FilterOp::Ne, FilterValue::String(value.into()))
    }

    /// Shorthand for a case-insensitive LIKE filter.
    pub fn ilike(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(field, FilterOp::ILike, FilterValue::String(pattern.into()))
    }

    /// Shorthand for a list-membership filter.
    pub fn any_of(field: impl Into<String>, values: Vec<String>) -> Self {
        Self::new(field, FilterOp::In, FilterValue::StringList(values))
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Self::new(field, FilterOp::IsNull, FilterValue::Null)
    }
}

/// Match `text` against a SQL `LIKE` pattern.
pub fn like_matches(text: &str, pattern: &str, case_insensitive: bool) -> bool {
    let (text, pattern): (Vec<char>, Vec<char>) = if case_insensitive {
        (
            text.to_lowercase().chars().collect(),
            pattern.to_lowercase().chars().collect(),
        )
    } else {
        (text.chars().collect(), pattern.chars().collect())
    };
    like_from(&text, &pattern)
}

fn like_from(text: &[char], pattern: &[char]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some(('%', rest)) => (0..=text.len()).any(|i| like_from(&text[i..], rest)),
        Some(('_', rest)) => !text.is_empty() && like_from(&text[1..], rest),
        Some((c, rest)) => text.first() == Some(c) && like_from(&text[1..], rest),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_matches() {
        assert!(like_matches("TRK-001", "TRK%", false));
        assert!(like_matches("trk-001", "TRK%", true));
        assert!(!like_matches("trk-001", "TRK%", false));
        assert!(like_matches("TRK-001", "%-00_", false));
        assert!(!like_matches("TRK-01", "%-00_", false));
    }

    #[test]
    fn test_filter_value_deserializes_untagged() {
        let value: FilterValue = serde_json::from_str("[\"a\",\"b\"]").expect("list");
        assert_eq!(value, FilterValue::StringList(vec!["a".into(), "b".into()]));
        let value: FilterValue = serde_json::from_str("42").expect("int");
        assert_eq!(value.as_text().as_deref(), Some("42"));
    }
}
