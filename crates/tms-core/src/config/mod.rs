//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod audit;
pub mod database;
pub mod logging;
pub mod validation;

use serde::{Deserialize, Serialize};

pub use self::audit::AuditConfig;
pub use self::database::DatabaseConfig;
pub use self::logging::LoggingConfig;
pub use self::validation::ValidationConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// Top-level deserialization target for the merged TOML configuration
/// files (default.toml + environment overlay) and `TMS__` variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Database connection settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Audit trail settings.
    #[serde(default)]
    pub audit: AuditConfig,
    /// Validation engine settings.
    #[serde(default)]
    pub validation: ValidationConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `TMS__`
    /// (`TMS__DATABASE__URL`).
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("TMS")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }

    /// Parse configuration from a TOML document.
    pub fn from_toml(source: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config = AppConfig::from_toml(
            r#"
            [database]
            url = "postgres://localhost/tms"
            "#,
        )
        .expect("config");

        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.logging.format, "json");
        assert!(config.audit.enabled);
        assert_eq!(config.audit.diff_max_depth, 10);
        assert!(!config.validation.fail_fast);
        assert!(!config.validation.single_connection);
    }

    #[test]
    fn test_sensitive_fields_by_resource() {
        let config = AppConfig::from_toml(
            r#"
            [database]
            url = "postgres://localhost/tms"

            [audit]
            diff_ignore_fields = ["updatedAt"]

            [audit.sensitive_fields]
            worker = ["licenseNumber"]
            "#,
        )
        .expect("config");

        assert_eq!(config.audit.diff_ignore_fields, vec!["updatedAt"]);
        assert_eq!(
            config.audit.sensitive_fields.get("worker"),
            Some(&vec!["licenseNumber".to_string()])
        );
    }
}
