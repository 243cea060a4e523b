//! Structural diff between two JSON states of a record.
//!
//! Objects are walked key by key and produce one [`FieldChange`] per
//! differing leaf, keyed by its dotted path. Arrays and scalars are
//! compared as wholes.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use chrono::DateTime;
use serde::Serialize;
use serde_json::{Map, Value};

use tms_core::{AppError, AppResult};
use tms_entity::audit::{ChangeType, FieldChange, FieldType};

/// Decides whether two values are equal for diff purposes.
pub type Comparator = Arc<dyn Fn(&Value, &Value) -> bool + Send + Sync>;

/// Changes keyed by dotted path.
pub type Changes = BTreeMap<String, FieldChange>;

/// Default nesting depth beyond which a diff fails.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Tuning for [`JsonDiffer`].
#[derive(Clone)]
pub struct DiffOptions {
    /// Keys skipped at every depth.
    pub ignore_fields: HashSet<String>,
    /// Comparators keyed by dotted path or by bare key. A path match wins.
    pub custom_comparators: HashMap<String, Comparator>,
    pub max_depth: usize,
    /// Compare strings without regard to case.
    pub ignore_case: bool,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            ignore_fields: HashSet::new(),
            custom_comparators: HashMap::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            ignore_case: false,
        }
    }
}

impl fmt::Debug for DiffOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiffOptions")
            .field("ignore_fields", &self.ignore_fields)
            .field(
                "custom_comparators",
                &self.custom_comparators.keys().collect::<Vec<_>>(),
            )
            .field("max_depth", &self.max_depth)
            .field("ignore_case", &self.ignore_case)
            .finish()
    }
}

impl DiffOptions {
    pub fn ignore_field(mut self, field: impl Into<String>) -> Self {
        self.ignore_fields.insert(field.into());
        self
    }

    pub fn ignore_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_fields.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn compare_with<F>(mut self, key: impl Into<String>, comparator: F) -> Self
    where
        F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        self.custom_comparators.insert(key.into(), Arc::new(comparator));
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }
}

/// Treats two RFC 3339 strings as equal when they name the same instant.
pub fn timestamps_equal(a: &Value, b: &Value) -> bool {
    match (parse_timestamp(a), parse_timestamp(b)) {
        (Some(a), Some(b)) => a == b,
        _ => a == b,
    }
}

fn parse_timestamp(value: &Value) -> Option<DateTime<chrono::FixedOffset>> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
}

/// JSON shape of `value`. Strings holding an RFC 3339 timestamp are
/// reported as date-times.
pub fn field_type_of(value: &Value) -> FieldType {
    match value {
        Value::Null => FieldType::Null,
        Value::Bool(_) => FieldType::Boolean,
        Value::Number(_) => FieldType::Number,
        Value::String(_) if parse_timestamp(value).is_some() => FieldType::DateTime,
        Value::String(_) => FieldType::String,
        Value::Array(_) => FieldType::Array,
        Value::Object(_) => FieldType::Object,
    }
}

/// Computes field-level changes between two record states.
#[derive(Debug, Clone, Default)]
pub struct JsonDiffer {
    options: DiffOptions,
}

impl JsonDiffer {
    pub fn new(options: DiffOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DiffOptions {
        &self.options
    }

    /// Diff two serializable states.
    pub fn diff_records<T: Serialize + ?Sized>(&self, before: &T, after: &T) -> AppResult<Changes> {
        let before = serde_json::to_value(before)?;
        let after = serde_json::to_value(after)?;
        self.diff(&before, &after)
    }

    /// Diff two JSON documents. `null` stands for an absent state; any
    /// other non-object root is rejected.
    pub fn diff(&self, before: &Value, after: &Value) -> AppResult<Changes> {
        let empty = Map::new();
        let before = root_object(before, &empty)?;
        let after = root_object(after, &empty)?;

        let mut changes = Changes::new();
        self.diff_objects(before, after, "", 1, &mut changes)?;
        Ok(changes)
    }

    fn diff_objects(
        &self,
        before: &Map<String, Value>,
        after: &Map<String, Value>,
        prefix: &str,
        depth: usize,
        changes: &mut Changes,
    ) -> AppResult<()> {
        if depth > self.options.max_depth {
            return Err(AppError::internal(format!(
                "Diff exceeded maximum depth of {} at '{prefix}'",
                self.options.max_depth
            )));
        }

        for (key, to) in after {
            if self.options.ignore_fields.contains(key) {
                continue;
            }
            let path = join_path(prefix, key);
            match before.get(key) {
                None => {
                    changes.insert(path.clone(), change(path, Value::Null, to.clone(), ChangeType::Created));
                }
                Some(from) => self.diff_values(key, path, from, to, depth, changes)?,
            }
        }

        for (key, from) in before {
            if self.options.ignore_fields.contains(key) || after.contains_key(key) {
                continue;
            }
            let path = join_path(prefix, key);
            changes.insert(path.clone(), change(path, from.clone(), Value::Null, ChangeType::Deleted));
        }

        Ok(())
    }

    fn diff_values(
        &self,
        key: &str,
        path: String,
        from: &Value,
        to: &Value,
        depth: usize,
        changes: &mut Changes,
    ) -> AppResult<()> {
        if let Some(comparator) = self
            .options
            .custom_comparators
            .get(&path)
            .or_else(|| self.options.custom_comparators.get(key))
        {
            if !comparator(from, to) {
                changes.insert(path.clone(), change(path, from.clone(), to.clone(), ChangeType::Updated));
            }
            return Ok(());
        }

        match (from, to) {
            (Value::Object(from), Value::Object(to)) => {
                self.diff_objects(from, to, &path, depth + 1, changes)
            }
            _ => {
                if !self.scalars_equal(from, to) {
                    changes.insert(path.clone(), change(path, from.clone(), to.clone(), ChangeType::Updated));
                }
                Ok(())
            }
        }
    }

    fn scalars_equal(&self, a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::String(a), Value::String(b)) if self.options.ignore_case => {
                a.to_lowercase() == b.to_lowercase()
            }
            _ => a == b,
        }
    }
}

fn root_object<'a>(value: &'a Value, empty: &'a Map<String, Value>) -> AppResult<&'a Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(empty),
        other => Err(AppError::internal(format!(
            "Cannot diff a JSON {:?} root; expected an object",
            field_type_of(other)
        ))),
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn change(path: String, from: Value, to: Value, change_type: ChangeType) -> FieldChange {
    let field_type = if to.is_null() {
        field_type_of(&from)
    } else {
        field_type_of(&to)
    };
    FieldChange {
        from,
        to,
        change_type,
        field_type,
        path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identical_documents_have_no_changes() {
        let doc = json!({"code": "TRK-1", "year": 2020, "meta": {"tags": ["a", "b"]}});
        let changes = JsonDiffer::default().diff(&doc, &doc).expect("diff");
        assert!(changes.is_empty());
    }

    #[test]
    fn test_nested_paths_and_change_types() {
        let before = json!({"code": "TRK-1", "vin": "1HGCM82633A004352", "owner": {"name": "Ann"}});
        let after = json!({"code": "TRK-2", "owner": {"name": "Bob"}, "model": "T680"});
        let changes = JsonDiffer::default().diff(&before, &after).expect("diff");

        assert_eq!(changes.len(), 4);
        assert_eq!(changes["code"].change_type, ChangeType::Updated);
        assert_eq!(changes["code"].from, json!("TRK-1"));
        assert_eq!(changes["owner.name"].to, json!("Bob"));
        assert_eq!(changes["owner.name"].path, "owner.name");
        assert_eq!(changes["vin"].change_type, ChangeType::Deleted);
        assert_eq!(changes["vin"].field_type, FieldType::String);
        assert_eq!(changes["model"].change_type, ChangeType::Created);
        assert_eq!(changes["model"].from, Value::Null);
    }

    #[test]
    fn test_arrays_compare_as_wholes() {
        let before = json!({"contacts": [{"name": "A"}]});
        let after = json!({"contacts": [{"name": "A"}, {"name": "B"}]});
        let changes = JsonDiffer::default().diff(&before, &after).expect("diff");
        assert_eq!(changes.len(), 1);
        assert_eq!(changes["contacts"].field_type, FieldType::Array);
    }

    #[test]
    fn test_ignore_fields_and_case() {
        let before = json!({"code": "trk-1", "version": 1, "nested": {"updatedAt": "x"}});
        let after = json!({"code": "TRK-1", "version": 2, "nested": {"updatedAt": "y"}});
        let differ = JsonDiffer::new(
            DiffOptions::default()
                .ignore_fields(["version", "updatedAt"])
                .with_ignore_case(true),
        );
        assert!(differ.diff(&before, &after).expect("diff").is_empty());
    }

    #[test]
    fn test_custom_comparator_by_key_and_path() {
        let before = json!({"updatedAt": "2024-01-01T00:00:00Z", "inner": {"updatedAt": "2024-01-01T00:00:00Z"}});
        let after = json!({"updatedAt": "2024-01-01T01:00:00+01:00", "inner": {"updatedAt": "2024-01-01T01:00:00+01:00"}});

        let differ = JsonDiffer::new(DiffOptions::default().compare_with("updatedAt", timestamps_equal));
        assert!(differ.diff(&before, &after).expect("diff").is_empty());

        let differ = JsonDiffer::new(
            DiffOptions::default()
                .compare_with("updatedAt", timestamps_equal)
                .compare_with("inner.updatedAt", |a: &Value, b: &Value| a == b),
        );
        let changes = differ.diff(&before, &after).expect("diff");
        assert_eq!(changes.keys().collect::<Vec<_>>(), vec!["inner.updatedAt"]);
        assert_eq!(changes["inner.updatedAt"].field_type, FieldType::DateTime);
    }

    #[test]
    fn test_max_depth_is_a_hard_error() {
        let deep = json!({"a": {"b": {"c": 1}}});
        let deeper = json!({"a": {"b": {"c": 2}}});
        let differ = JsonDiffer::new(DiffOptions::default().with_max_depth(2));
        let err = differ.diff(&deep, &deeper).expect_err("too deep");
        assert_eq!(err.kind, tms_core::ErrorKind::Internal);

        let differ = JsonDiffer::new(DiffOptions::default().with_max_depth(3));
        assert_eq!(differ.diff(&deep, &deeper).expect("diff").len(), 1);
    }

    #[test]
    fn test_null_root_means_absent_state() {
        let after = json!({"code": "TRK-1"});
        let changes = JsonDiffer::default().diff(&Value::Null, &after).expect("diff");
        assert_eq!(changes["code"].change_type, ChangeType::Created);

        assert!(JsonDiffer::default().diff(&json!(1), &after).is_err());
    }
}
