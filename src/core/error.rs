//! Error handling for release publishing
//!
//! Validation errors fail a run before anything is published. Every other
//! variant is scoped to a single package and is collected into an
//! [`AggregateError`] once all package tasks have finished.

use std::fmt;
use thiserror::Error;

/// Main error type for publish operations
#[derive(Error, Debug)]
pub enum PublishError {
    // Validation errors
    #[error("The tag `latest` can only be used for stable versions (got {version})")]
    LatestTagForPrerelease { version: String },

    #[error("Invalid version `{version}`: {message}")]
    InvalidVersion { version: String, message: String },

    #[error("Invalid distribution tag `{tag}`: {reason}")]
    InvalidTag { tag: String, reason: String },

    #[error("Invalid package name `{package}`: {reason}")]
    InvalidPackageName { package: String, reason: String },

    // Per-package errors
    #[error("[{package}] registry command failed: {message}")]
    CommandError { package: String, message: String },

    #[error("[{package}] could not read package manifest: {message}")]
    ManifestRead { package: String, message: String },

    #[error("Published version {expected} for {package} but the registry shows {actual}")]
    VersionMismatch {
        package: String,
        expected: String,
        actual: String,
    },

    #[error("Published version {expected} for {package} but the registry has no `{tag}` tag")]
    TagMissing {
        package: String,
        tag: String,
        expected: String,
    },

    #[error("[{package}] registry query failed: {message}")]
    RegistryQuery { package: String, message: String },

    #[error("[{package}] publish task aborted: {message}")]
    TaskFailed { package: String, message: String },

    // Run-level errors
    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl PublishError {
    /// Package this error belongs to, if it is scoped to one
    pub fn package(&self) -> Option<&str> {
        match self {
            Self::InvalidPackageName { package, .. }
            | Self::CommandError { package, .. }
            | Self::ManifestRead { package, .. }
            | Self::VersionMismatch { package, .. }
            | Self::TagMissing { package, .. }
            | Self::RegistryQuery { package, .. }
            | Self::TaskFailed { package, .. } => Some(package),
            Self::LatestTagForPrerelease { .. }
            | Self::InvalidVersion { .. }
            | Self::InvalidTag { .. }
            | Self::Aggregate(_)
            | Self::ConfigError(_) => None,
        }
    }

    /// True for errors raised before any package was touched
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::LatestTagForPrerelease { .. }
                | Self::InvalidVersion { .. }
                | Self::InvalidTag { .. }
                | Self::InvalidPackageName { .. }
                | Self::ConfigError(_)
        )
    }

    /// Check if re-running the step could succeed without changing the input
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::CommandError { .. }
            | Self::VersionMismatch { .. }
            | Self::TagMissing { .. }
            | Self::RegistryQuery { .. }
            | Self::TaskFailed { .. } => true,
            Self::Aggregate(aggregate) => aggregate
                .failures
                .iter()
                .all(|failure| failure.error.is_recoverable()),
            _ => false,
        }
    }

    /// Get suggested actions for this error
    pub fn suggested_actions(&self) -> Vec<&'static str> {
        match self {
            Self::LatestTagForPrerelease { .. } => vec![
                "Omit --tag to publish prereleases under `next`",
                "Pass an explicit prerelease tag such as `alpha` or `beta`",
            ],
            Self::InvalidVersion { .. } => {
                vec!["Use a SemVer version (e.g. 1.2.3 or 1.2.3-rc.1)"]
            }
            Self::InvalidTag { .. } => vec!["Pass a non-empty tag name"],
            Self::InvalidPackageName { .. } => {
                vec!["Check the package list passed by the release pipeline"]
            }
            Self::CommandError { .. } => vec![
                "Check the command output above",
                "Make sure you are logged in to the registry",
                "Pass --otp if two-factor authentication is enabled",
            ],
            Self::ManifestRead { .. } => vec![
                "Run the build before publishing",
                "Check that package.json has a version field",
            ],
            Self::VersionMismatch { .. } | Self::TagMissing { .. } => vec![
                "The registry may still be propagating; check again shortly",
                "Raise verification.maxAttempts to poll for longer",
            ],
            Self::RegistryQuery { .. } => vec!["Check network access to the registry"],
            Self::TaskFailed { .. } => vec!["Re-run the publish step"],
            Self::Aggregate(_) => vec!["Review each package failure listed above"],
            Self::ConfigError(_) => vec!["Fix .publish-config.yaml and retry"],
        }
    }

    /// Get error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::LatestTagForPrerelease { .. } => "LATEST_TAG_FOR_PRERELEASE",
            Self::InvalidVersion { .. } => "INVALID_VERSION",
            Self::InvalidTag { .. } => "INVALID_TAG",
            Self::InvalidPackageName { .. } => "INVALID_PACKAGE_NAME",
            Self::CommandError { .. } => "COMMAND_ERROR",
            Self::ManifestRead { .. } => "MANIFEST_READ",
            Self::VersionMismatch { .. } => "VERSION_MISMATCH",
            Self::TagMissing { .. } => "TAG_MISSING",
            Self::RegistryQuery { .. } => "REGISTRY_QUERY",
            Self::TaskFailed { .. } => "TASK_FAILED",
            Self::Aggregate(_) => "PUBLISH_FAILED",
            Self::ConfigError(_) => "CONFIG_ERROR",
        }
    }
}

/// A failure captured for one package during fan-out
#[derive(Debug)]
pub struct PackageFailure {
    pub package: String,
    pub error: PublishError,
}

/// Every package failure of a run, reported as one error
#[derive(Debug)]
pub struct AggregateError {
    pub registry: String,
    pub failures: Vec<PackageFailure>,
}

impl AggregateError {
    pub fn new(registry: impl Into<String>, failures: Vec<PackageFailure>) -> Self {
        Self {
            registry: registry.into(),
            failures,
        }
    }

    /// Names of the packages that failed, in request order
    pub fn packages(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.package.as_str()).collect()
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failure publishing to {}", self.registry)?;
        for failure in &self.failures {
            write!(f, "\n\n{}", failure.error)?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn mismatch(package: &str) -> PublishError {
        PublishError::VersionMismatch {
            package: package.to_string(),
            expected: "1.2.3".to_string(),
            actual: "1.2.2".to_string(),
        }
    }

    #[test]
    fn test_latest_for_prerelease_is_validation() {
        let error = PublishError::LatestTagForPrerelease {
            version: "1.0.0-rc.1".to_string(),
        };

        assert!(error.is_validation());
        assert!(!error.is_recoverable());
        assert_eq!(error.code(), "LATEST_TAG_FOR_PRERELEASE");
        assert!(error.package().is_none());
        assert!(error.to_string().contains("`latest`"));
    }

    #[test]
    fn test_version_mismatch_names_both_versions() {
        let error = mismatch("react-dom");

        let message = error.to_string();
        assert!(message.contains("react-dom"));
        assert!(message.contains("1.2.3"));
        assert!(message.contains("1.2.2"));
        assert_eq!(error.package(), Some("react-dom"));
        assert!(error.is_recoverable());
    }

    #[test]
    fn test_tag_missing_is_distinct_from_mismatch() {
        let error = PublishError::TagMissing {
            package: "scheduler".to_string(),
            tag: "next".to_string(),
            expected: "0.20.0".to_string(),
        };

        assert_eq!(error.code(), "TAG_MISSING");
        assert!(error.to_string().contains("no `next` tag"));
    }

    #[test]
    fn test_aggregate_lists_every_failure() {
        let aggregate = AggregateError::new(
            "npm",
            vec![
                PackageFailure {
                    package: "a".to_string(),
                    error: mismatch("a"),
                },
                PackageFailure {
                    package: "b".to_string(),
                    error: PublishError::CommandError {
                        package: "b".to_string(),
                        message: "E403".to_string(),
                    },
                },
            ],
        );

        assert_eq!(aggregate.packages(), vec!["a", "b"]);
        let message = aggregate.to_string();
        assert!(message.starts_with("Failure publishing to npm"));
        assert!(message.contains("for a but the registry shows 1.2.2"));
        assert!(message.contains("[b] registry command failed: E403"));

        let error = PublishError::from(aggregate);
        assert_eq!(error.code(), "PUBLISH_FAILED");
        assert!(error.is_recoverable());
    }

    #[test]
    fn test_aggregate_with_validation_failure_is_not_recoverable() {
        let error = PublishError::Aggregate(AggregateError::new(
            "npm",
            vec![PackageFailure {
                package: "x".to_string(),
                error: PublishError::InvalidPackageName {
                    package: "x".to_string(),
                    reason: "bad".to_string(),
                },
            }],
        ));

        assert!(!error.is_recoverable());
    }

    #[test]
    fn test_suggested_actions_present() {
        let error = PublishError::ConfigError("bad yaml".to_string());
        assert!(!error.suggested_actions().is_empty());
        assert!(error.to_string().contains("bad yaml"));
    }
}
