//! Core traits and types for release publishing
//!
//! [`RegistryClient`] is the seam between the orchestration layer and a
//! concrete registry. The npm CLI implementation lives in
//! `plugins::npm_plugin`; tests substitute an in-memory fake.

use crate::core::error::PublishError;
use crate::security::Otp;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

// ============================================================================
// Registry data
// ============================================================================

/// Mapping of distribution tag to the version it currently points at
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DistTags(HashMap<String, String>);

impl DistTags {
    /// Version published under `tag`, if the registry knows the tag
    pub fn get(&self, tag: &str) -> Option<&str> {
        self.0.get(tag).map(String::as_str)
    }

    pub fn insert(&mut self, tag: impl Into<String>, version: impl Into<String>) {
        self.0.insert(tag.into(), version.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DistTags {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// The subset of package.json read back after publishing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub version: String,
}

// ============================================================================
// Registry Client Trait
// ============================================================================

/// Operations the publisher needs from a package registry
///
/// Every call is scoped to one package; implementations report failures as
/// package-scoped [`PublishError`] variants so the orchestrator can collect
/// them without further wrapping.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Registry name used in reports (e.g. "npm")
    fn name(&self) -> &str;

    /// Publish the built package in `package_dir` under `tag`
    ///
    /// With `dry_run` set, implementations log the command and return
    /// without contacting the registry.
    async fn publish(
        &self,
        package: &str,
        package_dir: &Path,
        tag: &str,
        otp: Option<&Otp>,
        dry_run: bool,
    ) -> Result<(), PublishError>;

    /// Current tag-to-version mapping for `package`
    async fn dist_tags(&self, package: &str, working_dir: &Path)
    -> Result<DistTags, PublishError>;

    /// Point `tag` at `version` of `package`, overwriting any previous target
    async fn add_dist_tag(
        &self,
        package: &str,
        package_dir: &Path,
        version: &str,
        tag: &str,
        otp: Option<&Otp>,
        dry_run: bool,
    ) -> Result<(), PublishError>;
}
