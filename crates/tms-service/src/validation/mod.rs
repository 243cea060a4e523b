//! Staged record validation.

pub mod engine;
pub mod record;

pub use engine::{
    EngineConfig, FnRule, ValidationEngine, ValidationPriority, ValidationRule, ValidationStage,
};
pub use record::{IdDisciplineRule, RecordValidator, SelfCheckRule, UniquenessRule};
