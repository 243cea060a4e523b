//! Audit trail: structural diffs, sensitive-field masking and the service
//! that records user actions.

pub mod diff;
pub mod options;
pub mod sensitive;
pub mod service;

pub use diff::{Changes, Comparator, DiffOptions, JsonDiffer, timestamps_equal};
pub use options::{LogOption, LogOptions, with_comment, with_critical, with_diff, with_metadata};
pub use sensitive::{MASK, SensitiveAction, SensitiveFields};
pub use service::{AUDIT_VERSION, AuditService, LogActionParams};
