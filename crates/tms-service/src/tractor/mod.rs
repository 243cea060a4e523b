//! Tractor-specific rules and operations.

pub mod assignment;
pub mod rules;

pub use rules::{
    DistinctWorkersRule, EquipmentClassRule, PrimaryWorkerAvailabilityRule, WorkerReferenceRule,
};
