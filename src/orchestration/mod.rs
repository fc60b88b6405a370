//! Orchestration layer for release publishing
//!
//! [`Publisher`] drives one run: validation, concurrent per-package work,
//! and folding the outcomes into a single result.

pub mod action;
pub mod publisher;
pub mod report;
pub mod request;

pub use action::run_logged;
pub use publisher::Publisher;
pub use report::{PublishOutcome, PublishSummary, PublishedPackage};
pub use request::PublishRequest;
