//! Per-package outcomes and the run summary

use crate::core::error::{AggregateError, PackageFailure, PublishError};
use crate::core::tag::ResolvedTag;
use serde::Serialize;

/// What happened to one package that published cleanly
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedPackage {
    pub package: String,
    /// Version read from the built package.json
    pub version: String,
    /// The registry confirmed the version under the resolved tag
    pub verified: bool,
    /// `next` was moved to this version
    pub advanced_next: bool,
}

/// Result of one package task
#[derive(Debug)]
pub struct PublishOutcome {
    pub package: String,
    pub result: Result<PublishedPackage, PublishError>,
}

impl PublishOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Summary of a successful run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishSummary {
    pub run_id: uuid::Uuid,
    pub registry: String,
    pub tag: ResolvedTag,
    pub dry_run: bool,
    pub packages: Vec<PublishedPackage>,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub finished_at: chrono::DateTime<chrono::Utc>,
}

/// Fold task outcomes into a summary or one aggregate error
///
/// Any failure fails the whole run; successes are dropped in that case.
pub(crate) fn fold_outcomes(
    outcomes: Vec<PublishOutcome>,
    registry: &str,
) -> Result<Vec<PublishedPackage>, PublishError> {
    let mut published = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();

    for outcome in outcomes {
        match outcome.result {
            Ok(package) => published.push(package),
            Err(error) => failures.push(PackageFailure {
                package: outcome.package,
                error,
            }),
        }
    }

    if failures.is_empty() {
        Ok(published)
    } else {
        Err(AggregateError::new(registry, failures).into())
    }
}
