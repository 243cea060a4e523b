//! Tractors: powered units pulling trailers.

pub mod model;

pub use model::{Tractor, TractorAssignment};
