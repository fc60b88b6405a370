//! Version Validator - Validates semantic versioning (semver)
//!
//! # Example
//!
//! ```
//! use release_publisher::validation::VersionValidator;
//!
//! let validator = VersionValidator::new();
//! let result = validator.validate("1.2.3-rc.1");
//!
//! assert!(result.is_valid);
//! assert_eq!(result.prerelease.as_deref(), Some("rc.1"));
//! ```

use semver::Version;
use serde::{Deserialize, Serialize};

/// Result of version validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionValidationResult {
    /// Whether the version is valid semver
    pub is_valid: bool,
    /// Validation error message (if any)
    pub error: Option<String>,
    /// Pre-release identifiers (e.g., "alpha.1")
    pub prerelease: Option<String>,
}

impl VersionValidationResult {
    pub fn is_prerelease(&self) -> bool {
        self.prerelease.is_some()
    }
}

/// Validator for semantic versioning
#[derive(Debug, Default, Clone, Copy)]
pub struct VersionValidator;

impl VersionValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a version string
    ///
    /// Build metadata is accepted and ignored; only the prerelease component
    /// decides whether a version is stable. A leading `v` is allowed, as npm
    /// allows it.
    pub fn validate(&self, version_str: &str) -> VersionValidationResult {
        let trimmed = version_str.trim();
        let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
        match Version::parse(trimmed) {
            Ok(version) => VersionValidationResult {
                is_valid: true,
                error: None,
                prerelease: if version.pre.is_empty() {
                    None
                } else {
                    Some(version.pre.to_string())
                },
            },
            Err(e) => VersionValidationResult {
                is_valid: false,
                error: Some(e.to_string()),
                prerelease: None,
            },
        }
    }

    /// Check if version is a prerelease
    ///
    /// ```
    /// use release_publisher::validation::VersionValidator;
    ///
    /// let validator = VersionValidator::new();
    /// assert!(validator.is_prerelease("19.0.0-canary-2a3b4c"));
    /// assert!(!validator.is_prerelease("18.2.0"));
    /// ```
    pub fn is_prerelease(&self, version_str: &str) -> bool {
        self.validate(version_str).is_prerelease()
    }
}
