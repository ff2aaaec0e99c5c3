//! Moderation report integrity engine
//!
//! A user flags a single piece of content (comment, rating or playlist).
//! Creation enforces the cross-entity invariants: the target exists and is
//! visible, the reporter is not its author, and at most one report per
//! target is under review at a time. Decisions later flip the report state
//! without re-validating the target.

pub mod report;
pub mod resolver;
pub mod service;
pub mod target;

pub use report::{ModerationReport, ReportState};
pub use service::ReportService;
pub use target::ReportTarget;
