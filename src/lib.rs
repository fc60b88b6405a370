pub mod core;
pub mod orchestration;
pub mod plugins;
pub mod security;
pub mod telemetry;
pub mod validation;

pub use crate::core::*;
pub use orchestration::{PublishOutcome, PublishRequest, PublishSummary, PublishedPackage, Publisher};
pub use plugins::NpmPlugin;
pub use security::{CommandError, Otp, SafeCommandExecutor};
