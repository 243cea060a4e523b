//! Validation engine configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Stop after the first rule that records an error.
    #[serde(default)]
    pub fail_fast: bool,
    /// Check unique fields on the write's own connection, inside its
    /// repeatable-read transaction, instead of as a validation rule ahead
    /// of it.
    #[serde(default)]
    pub single_connection: bool,
}
