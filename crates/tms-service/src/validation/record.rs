//! Rules every domain record gets, and the per-record validator bundle.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;

use tms_core::traits::{
    DomainRecord, UniquenessChecker, UniquenessOperation, UniquenessSpec, duplicate_errors,
};
use tms_core::traits::record::ID_FIELD;
use tms_core::{AppResult, ErrorCode, MultiError, ValidationContext};

use super::engine::{EngineConfig, ValidationEngine, ValidationPriority, ValidationRule, ValidationStage};

/// Runs the record's own field checks.
pub struct SelfCheckRule<R>(PhantomData<fn(&R)>);

impl<R> Default for SelfCheckRule<R> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

#[async_trait]
impl<R: DomainRecord> ValidationRule<R> for SelfCheckRule<R> {
    fn name(&self) -> &str {
        "self_check"
    }

    fn stage(&self) -> ValidationStage {
        ValidationStage::Basic
    }

    fn priority(&self) -> ValidationPriority {
        ValidationPriority::High
    }

    async fn validate(
        &self,
        record: &R,
        ctx: &ValidationContext,
        errors: &mut MultiError,
    ) -> AppResult<()> {
        DomainRecord::validate(record, ctx, errors);
        Ok(())
    }
}

/// New records must not carry an id; updates must.
pub struct IdDisciplineRule<R>(PhantomData<fn(&R)>);

impl<R> Default for IdDisciplineRule<R> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

#[async_trait]
impl<R: DomainRecord> ValidationRule<R> for IdDisciplineRule<R> {
    fn name(&self) -> &str {
        "id_discipline"
    }

    fn stage(&self) -> ValidationStage {
        ValidationStage::DataIntegrity
    }

    fn priority(&self) -> ValidationPriority {
        ValidationPriority::High
    }

    async fn validate(
        &self,
        record: &R,
        ctx: &ValidationContext,
        errors: &mut MultiError,
    ) -> AppResult<()> {
        match (ctx.is_create(), record.id()) {
            (true, Some(_)) => {
                errors.add(ID_FIELD, ErrorCode::Invalid, "ID cannot be set on create")
            }
            (false, None) => errors.add(ID_FIELD, ErrorCode::Required, "ID is required for update"),
            _ => {}
        }
        Ok(())
    }
}

/// Looks up the store for unique values already taken in the tenant.
pub struct UniquenessRule<R> {
    checker: Arc<dyn UniquenessChecker>,
    _record: PhantomData<fn(&R)>,
}

impl<R> UniquenessRule<R> {
    pub fn new(checker: Arc<dyn UniquenessChecker>) -> Self {
        Self {
            checker,
            _record: PhantomData,
        }
    }
}

#[async_trait]
impl<R: DomainRecord> ValidationRule<R> for UniquenessRule<R> {
    fn name(&self) -> &str {
        "uniqueness"
    }

    fn stage(&self) -> ValidationStage {
        ValidationStage::DataIntegrity
    }

    async fn validate(
        &self,
        record: &R,
        ctx: &ValidationContext,
        errors: &mut MultiError,
    ) -> AppResult<()> {
        // Without an id the lookup cannot exclude the record's own row; the
        // id rule reports the missing id.
        if ctx.is_update() && record.id().is_none() {
            return Ok(());
        }

        let operation = if ctx.is_create() {
            UniquenessOperation::Create
        } else {
            UniquenessOperation::Update
        };
        let spec = UniquenessSpec::for_record(record, operation)?;
        if spec.is_empty() {
            return Ok(());
        }

        let conflicts = self.checker.find_conflicts(&spec).await?;
        errors.merge(duplicate_errors(&conflicts));
        Ok(())
    }
}

/// The validation engine of one record type, preloaded with the rules
/// every record needs.
pub struct RecordValidator<R> {
    engine: ValidationEngine<R>,
}

impl<R: DomainRecord> RecordValidator<R> {
    /// Self-check and id discipline only.
    pub fn new(config: EngineConfig) -> Self {
        let mut engine = ValidationEngine::new(config);
        engine
            .add_rule(Arc::new(SelfCheckRule::default()))
            .add_rule(Arc::new(IdDisciplineRule::default()));
        Self { engine }
    }

    /// Add the uniqueness lookup for the record's unique fields.
    pub fn with_uniqueness(self, checker: Arc<dyn UniquenessChecker>) -> Self {
        if R::UNIQUE_FIELDS.is_empty() {
            return self;
        }
        self.with_rule(Arc::new(UniquenessRule::new(checker)))
    }

    pub fn with_rule(mut self, rule: Arc<dyn ValidationRule<R>>) -> Self {
        self.engine.add_rule(rule);
        self
    }

    pub fn engine(&self) -> &ValidationEngine<R> {
        &self.engine
    }

    pub async fn validate(&self, record: &R, ctx: &ValidationContext) -> AppResult<()> {
        self.engine.validate(record, ctx).await
    }
}
