//! Configuration structures for release-publisher
//!
//! Every field has a default, so an absent or partial
//! `.publish-config.yaml` is valid.

use crate::core::retry::PollOptions;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct PublisherConfig {
    /// Registry access settings
    pub registry: RegistrySettings,

    /// Build output directory holding one folder per package, relative to
    /// the working directory
    pub build_dir: PathBuf,

    /// Post-publish verification settings
    pub verification: VerificationSettings,

    /// Timeout for each registry command; unset means wait indefinitely
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_timeout_secs: Option<u64>,

    /// Label of the long-running action shown on the console
    pub action_label: String,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            registry: RegistrySettings::default(),
            build_dir: PathBuf::from("build").join("node_modules"),
            verification: VerificationSettings::default(),
            command_timeout_secs: None,
            action_label: "Publishing packages to NPM".to_string(),
        }
    }
}

impl PublisherConfig {
    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }

    pub fn poll_options(&self) -> PollOptions {
        PollOptions {
            max_attempts: self.verification.max_attempts,
            initial_delay: Duration::from_secs(self.verification.propagation_delay_secs),
            max_delay: Duration::from_secs(self.verification.max_delay_secs),
            backoff_multiplier: self.verification.backoff_multiplier,
        }
    }
}

/// Registry access settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RegistrySettings {
    /// Registry CLI binary (default: "npm")
    pub command: String,

    /// Registry base URL used for HTTP dist-tag queries
    pub url: String,

    /// How dist-tags are read back after publishing
    pub query_source: QuerySourceKind,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            command: "npm".to_string(),
            url: "https://registry.npmjs.org".to_string(),
            query_source: QuerySourceKind::Cli,
        }
    }
}

/// Where dist-tags are read from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QuerySourceKind {
    /// `npm info <pkg> dist-tags --json`
    Cli,
    /// `GET <url>/-/package/<pkg>/dist-tags`
    Http,
}

/// Post-publish verification settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct VerificationSettings {
    /// Wait before the first dist-tag query (default: 5)
    pub propagation_delay_secs: u64,

    /// Total number of dist-tag queries (default: 1)
    pub max_attempts: u32,

    /// Backoff multiplier between extra queries (default: 2.0)
    pub backoff_multiplier: f64,

    /// Cap for the delay between extra queries (default: 30)
    pub max_delay_secs: u64,
}

impl Default for VerificationSettings {
    fn default() -> Self {
        let poll = PollOptions::default();
        Self {
            propagation_delay_secs: poll.initial_delay.as_secs(),
            max_attempts: poll.max_attempts,
            backoff_multiplier: poll.backoff_multiplier,
            max_delay_secs: poll.max_delay.as_secs(),
        }
    }
}
