//! Generic record service.

pub mod service;

pub use service::RecordService;
