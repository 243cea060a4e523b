//! Drivers and other workers assignable to equipment.

pub mod model;

pub use model::{Worker, WorkerType};
