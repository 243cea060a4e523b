//! Optional extras attached to a single audit entry.

use serde::Serialize;
use serde_json::{Map, Value};

use tms_core::AppResult;

/// Extras collected from [`LogOption`]s before an entry is built.
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    pub comment: Option<String>,
    /// States to diff; when absent the entry carries no changes.
    pub diff: Option<(Value, Value)>,
    pub metadata: Map<String, Value>,
    pub critical: bool,
}

/// One modifier applied to [`LogOptions`].
pub type LogOption = Box<dyn FnOnce(&mut LogOptions) -> AppResult<()> + Send>;

pub fn with_comment(comment: impl Into<String>) -> LogOption {
    let comment = comment.into();
    Box::new(move |opts| {
        opts.comment = Some(comment);
        Ok(())
    })
}

/// Record the field-level changes between `before` and `after`.
pub fn with_diff<T: Serialize + ?Sized>(before: &T, after: &T) -> LogOption {
    let states = serde_json::to_value(before).and_then(|b| Ok((b, serde_json::to_value(after)?)));
    Box::new(move |opts| {
        opts.diff = Some(states?);
        Ok(())
    })
}

pub fn with_metadata(key: impl Into<String>, value: impl Serialize) -> LogOption {
    let key = key.into();
    let value = serde_json::to_value(value);
    Box::new(move |opts| {
        opts.metadata.insert(key, value?);
        Ok(())
    })
}

pub fn with_critical() -> LogOption {
    Box::new(|opts| {
        opts.critical = true;
        Ok(())
    })
}

impl LogOptions {
    /// Fold `options` in order. Later options win.
    pub fn collect(options: Vec<LogOption>) -> AppResult<Self> {
        let mut opts = Self::default();
        for option in options {
            option(&mut opts)?;
        }
        Ok(opts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_options_fold_in_order() {
        let opts = LogOptions::collect(vec![
            with_comment("first"),
            with_metadata("source", "import"),
            with_comment("second"),
            with_diff(&json!({"a": 1}), &json!({"a": 2})),
        ])
        .expect("options");

        assert_eq!(opts.comment.as_deref(), Some("second"));
        assert_eq!(opts.metadata["source"], json!("import"));
        assert_eq!(opts.diff, Some((json!({"a": 1}), json!({"a": 2}))));
        assert!(!opts.critical);
    }
}
