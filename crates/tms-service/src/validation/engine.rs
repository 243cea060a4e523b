//! Rule runner organized by stage and priority.
//!
//! Stages run in order and each one runs to completion. Within a stage,
//! rules run by priority (ties keep registration order). Errors recorded
//! by a rule accumulate; once a stage finishes with any error recorded,
//! later stages are skipped. A rule returning `Err` stops the run
//! immediately.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use tms_core::config::ValidationConfig;
use tms_core::{AppError, AppResult, MultiError, ValidationContext};

/// Validation phase. Declaration order is execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ValidationStage {
    /// Presence, bounds, formats, enum membership; the record's self-check.
    Basic,
    /// Uniqueness, id discipline, references that must exist.
    DataIntegrity,
    /// Relationships to other records.
    CrossEntity,
    /// Tenant-configured constraints.
    BusinessRules,
}

impl ValidationStage {
    pub fn all() -> [ValidationStage; 4] {
        [
            Self::Basic,
            Self::DataIntegrity,
            Self::CrossEntity,
            Self::BusinessRules,
        ]
    }
}

impl fmt::Display for ValidationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Basic => "basic",
            Self::DataIntegrity => "data_integrity",
            Self::CrossEntity => "cross_entity",
            Self::BusinessRules => "business_rules",
        };
        f.write_str(s)
    }
}

/// Order of a rule within its stage. Declaration order is execution order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum ValidationPriority {
    High,
    #[default]
    Normal,
    Low,
}

/// One validation rule for records of type `R`.
#[async_trait]
pub trait ValidationRule<R>: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    fn stage(&self) -> ValidationStage;

    fn priority(&self) -> ValidationPriority {
        ValidationPriority::Normal
    }

    /// Record problems in `errors`. Return `Err` only when the rule cannot
    /// run at all; that aborts the whole validation.
    async fn validate(
        &self,
        record: &R,
        ctx: &ValidationContext,
        errors: &mut MultiError,
    ) -> AppResult<()>;
}

type RuleFn<R> = dyn Fn(&R, &ValidationContext, &mut MultiError) -> AppResult<()> + Send + Sync;

/// A synchronous rule built from a closure.
pub struct FnRule<R> {
    name: String,
    stage: ValidationStage,
    priority: ValidationPriority,
    check: Box<RuleFn<R>>,
}

impl<R> FnRule<R> {
    pub fn new<F>(name: impl Into<String>, stage: ValidationStage, check: F) -> Self
    where
        F: Fn(&R, &ValidationContext, &mut MultiError) -> AppResult<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            stage,
            priority: ValidationPriority::Normal,
            check: Box::new(check),
        }
    }

    pub fn with_priority(mut self, priority: ValidationPriority) -> Self {
        self.priority = priority;
        self
    }
}

#[async_trait]
impl<R: Send + Sync> ValidationRule<R> for FnRule<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn stage(&self) -> ValidationStage {
        self.stage
    }

    fn priority(&self) -> ValidationPriority {
        self.priority
    }

    async fn validate(
        &self,
        record: &R,
        ctx: &ValidationContext,
        errors: &mut MultiError,
    ) -> AppResult<()> {
        (self.check)(record, ctx, errors)
    }
}

/// Engine behavior switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Stop after the first rule that records an error.
    pub fail_fast: bool,
}

impl From<&ValidationConfig> for EngineConfig {
    fn from(config: &ValidationConfig) -> Self {
        Self {
            fail_fast: config.fail_fast,
        }
    }
}

/// Runs registered rules stage by stage.
pub struct ValidationEngine<R> {
    rules: Vec<Arc<dyn ValidationRule<R>>>,
    config: EngineConfig,
}

impl<R> Clone for ValidationEngine<R> {
    fn clone(&self) -> Self {
        Self {
            rules: self.rules.clone(),
            config: self.config,
        }
    }
}

impl<R: Send + Sync> ValidationEngine<R> {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            rules: Vec::new(),
            config,
        }
    }

    pub fn add_rule(&mut self, rule: Arc<dyn ValidationRule<R>>) -> &mut Self {
        self.rules.push(rule);
        self
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn clear(&mut self) {
        self.rules.clear();
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    /// Rules of `stage` in execution order.
    pub fn rules_by_stage_and_priority(&self, stage: ValidationStage) -> Vec<Arc<dyn ValidationRule<R>>> {
        let mut rules: Vec<_> = self
            .rules
            .iter()
            .filter(|rule| rule.stage() == stage)
            .cloned()
            .collect();
        rules.sort_by_key(|rule| rule.priority());
        rules
    }

    /// Run every applicable rule and return what they recorded.
    pub async fn collect(&self, record: &R, ctx: &ValidationContext) -> AppResult<MultiError> {
        let mut errors = MultiError::new();

        for stage in ValidationStage::all() {
            for rule in self.rules_by_stage_and_priority(stage) {
                let before = errors.len();
                rule.validate(record, ctx, &mut errors).await.map_err(|e| {
                    debug!(rule = rule.name(), %stage, error = %e, "Validation rule failed");
                    e
                })?;
                if self.config.fail_fast && errors.len() > before {
                    return Ok(errors);
                }
            }
            if !errors.is_empty() {
                debug!(%stage, errors = errors.len(), "Validation stopped after stage");
                break;
            }
        }

        Ok(errors)
    }

    /// `Ok(())` when no rule recorded an error, else a validation error
    /// carrying every recorded field error.
    pub async fn validate(&self, record: &R, ctx: &ValidationContext) -> AppResult<()> {
        let errors = self.collect(record, ctx).await?;
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::invalid(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use tms_core::ErrorCode;
    use tms_core::types::{BusinessUnitId, OrganizationId, TenantContext, UserId};

    fn ctx() -> ValidationContext {
        ValidationContext::create(TenantContext::new(
            OrganizationId::new(),
            BusinessUnitId::new(),
            UserId::new(),
        ))
    }

    fn recording_rule(
        log: Arc<Mutex<Vec<String>>>,
        name: &'static str,
        stage: ValidationStage,
        priority: ValidationPriority,
        fails: bool,
    ) -> Arc<dyn ValidationRule<()>> {
        Arc::new(
            FnRule::new(name, stage, move |_: &(), _, errors: &mut MultiError| {
                log.lock().expect("log").push(name.to_string());
                if fails {
                    errors.add(name, ErrorCode::Invalid, format!("{name} failed"));
                }
                Ok(())
            })
            .with_priority(priority),
        )
    }

    #[tokio::test]
    async fn test_stage_then_priority_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut engine = ValidationEngine::new(EngineConfig::default());
        engine
            .add_rule(recording_rule(log.clone(), "cross", ValidationStage::CrossEntity, ValidationPriority::High, false))
            .add_rule(recording_rule(log.clone(), "basic-low", ValidationStage::Basic, ValidationPriority::Low, false))
            .add_rule(recording_rule(log.clone(), "basic-high", ValidationStage::Basic, ValidationPriority::High, false))
            .add_rule(recording_rule(log.clone(), "integrity", ValidationStage::DataIntegrity, ValidationPriority::Normal, false));

        engine.validate(&(), &ctx()).await.expect("valid");
        assert_eq!(
            *log.lock().expect("log"),
            vec!["basic-high", "basic-low", "integrity", "cross"]
        );
    }

    #[tokio::test]
    async fn test_errors_stop_descent_but_finish_stage() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut engine = ValidationEngine::new(EngineConfig::default());
        engine
            .add_rule(recording_rule(log.clone(), "first", ValidationStage::Basic, ValidationPriority::High, true))
            .add_rule(recording_rule(log.clone(), "second", ValidationStage::Basic, ValidationPriority::Low, true))
            .add_rule(recording_rule(log.clone(), "later", ValidationStage::CrossEntity, ValidationPriority::High, false));

        let err = engine.validate(&(), &ctx()).await.expect_err("invalid");
        assert_eq!(err.kind, tms_core::ErrorKind::Validation);
        assert_eq!(err.field_errors().expect("fields").len(), 2);
        assert_eq!(*log.lock().expect("log"), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_fail_fast_stops_after_first_failing_rule() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut engine = ValidationEngine::new(EngineConfig { fail_fast: true });
        engine
            .add_rule(recording_rule(log.clone(), "first", ValidationStage::Basic, ValidationPriority::High, true))
            .add_rule(recording_rule(log.clone(), "second", ValidationStage::Basic, ValidationPriority::Low, true));

        let errors = engine.collect(&(), &ctx()).await.expect("collect");
        assert_eq!(errors.len(), 1);
        assert_eq!(*log.lock().expect("log"), vec!["first"]);
    }

    #[tokio::test]
    async fn test_hard_error_aborts() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut engine = ValidationEngine::new(EngineConfig::default());
        engine
            .add_rule(Arc::new(FnRule::new(
                "boom",
                ValidationStage::Basic,
                |_: &(), _, _: &mut MultiError| Err(AppError::database("lookup failed")),
            )))
            .add_rule(recording_rule(log.clone(), "after", ValidationStage::Basic, ValidationPriority::Low, false));

        let err = engine.validate(&(), &ctx()).await.expect_err("hard error");
        assert_eq!(err.kind, tms_core::ErrorKind::Database);
        assert!(log.lock().expect("log").is_empty());
    }

    #[test]
    fn test_introspection() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut engine = ValidationEngine::new(EngineConfig::default());
        engine.add_rule(recording_rule(log, "a", ValidationStage::Basic, ValidationPriority::Normal, false));
        assert_eq!(engine.rule_count(), 1);
        assert_eq!(engine.rules_by_stage_and_priority(ValidationStage::Basic).len(), 1);
        assert!(engine.rules_by_stage_and_priority(ValidationStage::CrossEntity).is_empty());
        engine.clear();
        assert_eq!(engine.rule_count(), 0);
    }
}
