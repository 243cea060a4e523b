//! Audit trail configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// How the audit service records and diffs changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// When disabled, `log_action` is a no-op.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Category stamped on entries written by services.
    #[serde(default = "default_category")]
    pub category: String,
    /// Nesting depth beyond which a diff fails.
    #[serde(default = "default_max_depth")]
    pub diff_max_depth: usize,
    /// Field names skipped by the differ at every depth.
    #[serde(default)]
    pub diff_ignore_fields: Vec<String>,
    /// Compare strings case-insensitively when diffing.
    #[serde(default)]
    pub diff_ignore_case: bool,
    /// Fields masked before persistence, keyed by resource name.
    #[serde(default)]
    pub sensitive_fields: HashMap<String, Vec<String>>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            category: default_category(),
            diff_max_depth: default_max_depth(),
            diff_ignore_fields: Vec::new(),
            diff_ignore_case: false,
            sensitive_fields: HashMap::new(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_category() -> String {
    "system".to_string()
}

fn default_max_depth() -> usize {
    10
}
