//! Publisher - publishes a release's packages and verifies them
//!
//! Manages the publishing workflow for one release:
//! - Tag resolution and input validation (fail fast, nothing published)
//! - Concurrent per-package publish, manifest read-back and verification
//! - Moving `next` along with stable releases
//! - Folding per-package outcomes into one result

use crate::core::config::PublisherConfig;
use crate::core::error::PublishError;
use crate::core::retry::{Poll, PollOptions, VerificationPoller};
use crate::core::tag::{NEXT_TAG, TagPlan};
use crate::core::traits::{PackageManifest, RegistryClient};
use crate::orchestration::action::run_logged;
use crate::orchestration::report::{PublishOutcome, PublishSummary, PublishedPackage, fold_outcomes};
use crate::orchestration::request::PublishRequest;
use crate::plugins::NpmPlugin;
use crate::security::Otp;
use crate::validation::validate_package_name;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Instrument;

/// Main publish orchestrator
pub struct Publisher {
    registry: Arc<dyn RegistryClient>,
    config: PublisherConfig,
}

impl Publisher {
    pub fn new(registry: Arc<dyn RegistryClient>, config: PublisherConfig) -> Self {
        Self { registry, config }
    }

    /// Publisher backed by the npm CLI described by `config`
    pub fn from_config(config: PublisherConfig) -> Result<Self, PublishError> {
        let registry = NpmPlugin::from_config(&config)?;
        Ok(Self::new(Arc::new(registry), config))
    }

    /// Publish every package of `request`
    ///
    /// Fails without publishing anything when the tag, version, or a package
    /// name is invalid. Otherwise every package is attempted; if any of them
    /// fails the run fails with [`PublishError::Aggregate`] listing each
    /// failure.
    pub async fn publish(&self, request: PublishRequest) -> Result<PublishSummary, PublishError> {
        run_logged(&self.config.action_label, self.publish_packages(request)).await
    }

    async fn publish_packages(
        &self,
        request: PublishRequest,
    ) -> Result<PublishSummary, PublishError> {
        let started_at = chrono::Utc::now();
        let run_id = uuid::Uuid::new_v4();

        let plan = TagPlan::resolve(&request.version, request.tag.as_deref())?;
        for package in &request.packages {
            validate_package_name(package)?;
        }

        let span = tracing::info_span!(
            "publish",
            %run_id,
            registry = self.registry.name(),
            version = %request.version,
            tag = %plan.tag,
            dry_run = request.dry_run
        );
        if request.packages.is_empty() {
            span.in_scope(|| tracing::warn!("no packages to publish"));
        }

        let build_root = request.working_directory.join(&self.config.build_dir);
        let mut tasks = Vec::with_capacity(request.packages.len());
        for package in &request.packages {
            let job = PackageJob {
                package: package.clone(),
                package_dir: build_root.join(package),
                working_dir: request.working_directory.clone(),
                plan: plan.clone(),
                otp: request.otp.clone(),
                dry_run: request.dry_run,
                poll: self.config.poll_options(),
            };
            let registry = Arc::clone(&self.registry);
            let task = tokio::spawn(job.run(registry).instrument(span.clone()));
            tasks.push((package.clone(), task));
        }

        // Wait for every task; a sibling's failure never cancels the others
        let mut outcomes = Vec::with_capacity(tasks.len());
        for (package, task) in tasks {
            let outcome = match task.await {
                Ok(outcome) => outcome,
                Err(e) => PublishOutcome {
                    package: package.clone(),
                    result: Err(PublishError::TaskFailed {
                        package,
                        message: e.to_string(),
                    }),
                },
            };
            outcomes.push(outcome);
        }

        let packages = fold_outcomes(outcomes, self.registry.name())?;

        Ok(PublishSummary {
            run_id,
            registry: self.registry.name().to_string(),
            tag: plan.tag,
            dry_run: request.dry_run,
            packages,
            started_at,
            finished_at: chrono::Utc::now(),
        })
    }
}

/// Work for a single package, owned so it can run on its own task
struct PackageJob {
    package: String,
    package_dir: PathBuf,
    working_dir: PathBuf,
    plan: TagPlan,
    otp: Option<Otp>,
    dry_run: bool,
    poll: PollOptions,
}

impl PackageJob {
    async fn run(self, registry: Arc<dyn RegistryClient>) -> PublishOutcome {
        let result = self.publish(registry.as_ref()).await;

        match &result {
            Ok(published) => tracing::info!(
                package = %self.package,
                version = %published.version,
                verified = published.verified,
                advanced_next = published.advanced_next,
                "published"
            ),
            Err(e) => tracing::warn!(package = %self.package, error = %e, "publish failed"),
        }

        PublishOutcome {
            package: self.package,
            result,
        }
    }

    async fn publish(
        &self,
        registry: &dyn RegistryClient,
    ) -> Result<PublishedPackage, PublishError> {
        let tag = self.plan.tag.as_str();
        let otp = self.otp.as_ref();

        registry
            .publish(&self.package, &self.package_dir, tag, otp, self.dry_run)
            .await?;

        let manifest = read_manifest(&self.package, &self.package_dir.join("package.json")).await?;
        let version = manifest.version;

        if self.dry_run {
            return Ok(PublishedPackage {
                package: self.package.clone(),
                version,
                verified: false,
                advanced_next: false,
            });
        }

        self.verify(registry, tag, &version).await?;

        // Keep `next` from lagging behind a fresh stable release
        let advanced_next = self.plan.advances_next();
        if advanced_next {
            registry
                .add_dist_tag(&self.package, &self.package_dir, &version, NEXT_TAG, otp, false)
                .await?;
        }

        Ok(PublishedPackage {
            package: self.package.clone(),
            version,
            verified: true,
            advanced_next,
        })
    }

    /// Check that the registry reports `expected` under `tag`
    async fn verify(
        &self,
        registry: &dyn RegistryClient,
        tag: &str,
        expected: &str,
    ) -> Result<(), PublishError> {
        let package = self.package.as_str();
        let working_dir = self.working_dir.as_path();

        let seen = VerificationPoller::new(self.poll.clone())
            .poll(|| async move {
                let tags = registry.dist_tags(package, working_dir).await?;
                let actual = tags.get(tag).map(str::to_string);
                Ok::<_, PublishError>(if actual.as_deref() == Some(expected) {
                    Poll::Ready(actual)
                } else {
                    Poll::Pending(actual)
                })
            })
            .await?;

        match seen.into_inner() {
            Some(actual) if actual == expected => Ok(()),
            Some(actual) => Err(PublishError::VersionMismatch {
                package: package.to_string(),
                expected: expected.to_string(),
                actual,
            }),
            None => Err(PublishError::TagMissing {
                package: package.to_string(),
                tag: tag.to_string(),
                expected: expected.to_string(),
            }),
        }
    }
}

async fn read_manifest(package: &str, path: &Path) -> Result<PackageManifest, PublishError> {
    let manifest_error = |message: String| PublishError::ManifestRead {
        package: package.to_string(),
        message,
    };

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| manifest_error(format!("{}: {}", path.display(), e)))?;

    serde_json::from_str(&content).map_err(|e| manifest_error(format!("{}: {}", path.display(), e)))
}
