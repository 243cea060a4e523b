//! Commodities hauled on shipments.

pub mod model;

pub use model::Commodity;
