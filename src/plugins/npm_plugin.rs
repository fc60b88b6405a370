//! NPM Plugin - npm CLI implementation of [`RegistryClient`]
//!
//! - `npm publish --tag <tag> [--otp <otp>]` inside the built package folder
//! - `npm dist-tag add <pkg>@<version> <tag> [--otp <otp>]`
//! - `npm info <pkg> dist-tags --json`, or the HTTP endpoint when configured

use crate::core::config::{PublisherConfig, QuerySourceKind};
use crate::core::error::PublishError;
use crate::core::traits::{DistTags, RegistryClient};
use crate::plugins::http_dist_tags::HttpDistTagClient;
use crate::security::{CommandArg, CommandError, Otp, SafeCommandExecutor};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// Where dist-tags are read from after publishing
#[derive(Debug, Clone)]
pub enum QuerySource {
    Cli,
    Http(HttpDistTagClient),
}

/// npm registry client driven through the npm-compatible CLI
#[derive(Debug, Clone)]
pub struct NpmPlugin {
    command: String,
    timeout: Option<Duration>,
    query: QuerySource,
}

impl Default for NpmPlugin {
    fn default() -> Self {
        Self::new("npm")
    }
}

impl NpmPlugin {
    /// Create a client for `command` (npm, pnpm or yarn) that queries via the CLI
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            timeout: None,
            query: QuerySource::Cli,
        }
    }

    pub fn from_config(config: &PublisherConfig) -> Result<Self, PublishError> {
        let query = match config.registry.query_source {
            QuerySourceKind::Cli => QuerySource::Cli,
            QuerySourceKind::Http => QuerySource::Http(HttpDistTagClient::new(
                config.registry.url.clone(),
                config.command_timeout(),
            )?),
        };

        Ok(Self {
            command: config.registry.command.clone(),
            timeout: config.command_timeout(),
            query,
        })
    }

    /// Arguments for `npm publish`
    pub fn publish_args(tag: &str, otp: Option<&Otp>) -> Vec<CommandArg> {
        let mut args: Vec<CommandArg> = vec!["publish".into(), "--tag".into(), tag.into()];
        Self::push_otp(&mut args, otp);
        args
    }

    /// Arguments for `npm dist-tag add`
    pub fn dist_tag_add_args(
        package: &str,
        version: &str,
        tag: &str,
        otp: Option<&Otp>,
    ) -> Vec<CommandArg> {
        let mut args: Vec<CommandArg> = vec![
            "dist-tag".into(),
            "add".into(),
            format!("{}@{}", package, version).into(),
            tag.into(),
        ];
        Self::push_otp(&mut args, otp);
        args
    }

    /// Arguments for `npm info <pkg> dist-tags --json`
    pub fn dist_tags_args(package: &str) -> Vec<CommandArg> {
        vec![
            "info".into(),
            package.into(),
            "dist-tags".into(),
            "--json".into(),
        ]
    }

    /// Parse the JSON printed by `npm info <pkg> dist-tags --json`
    pub fn parse_dist_tags(package: &str, stdout: &str) -> Result<DistTags, PublishError> {
        serde_json::from_str(stdout).map_err(|e| PublishError::RegistryQuery {
            package: package.to_string(),
            message: format!("unexpected `npm info` output: {}", e),
        })
    }

    fn push_otp(args: &mut Vec<CommandArg>, otp: Option<&Otp>) {
        // https://docs.npmjs.com/configuring-two-factor-authentication
        if let Some(otp) = otp {
            args.push("--otp".into());
            args.push(CommandArg::Secret(otp.clone()));
        }
    }

    fn executor(&self, dir: &Path, dry_run: bool) -> Result<SafeCommandExecutor, CommandError> {
        let mut executor = SafeCommandExecutor::new(dir)?;
        executor.set_timeout(self.timeout);
        executor.set_dry_run(dry_run);
        Ok(executor)
    }

    fn command_error(package: &str, error: CommandError) -> PublishError {
        let message = match &error {
            CommandError::NonZeroExit { stderr, .. }
                if stderr.contains("EOTP") || stderr.contains("one-time password") =>
            {
                format!("{} (pass --otp with a current one-time password)", error)
            }
            _ => error.to_string(),
        };
        PublishError::CommandError {
            package: package.to_string(),
            message,
        }
    }
}

#[async_trait]
impl RegistryClient for NpmPlugin {
    fn name(&self) -> &str {
        "npm"
    }

    async fn publish(
        &self,
        package: &str,
        package_dir: &Path,
        tag: &str,
        otp: Option<&Otp>,
        dry_run: bool,
    ) -> Result<(), PublishError> {
        let executor = self
            .executor(package_dir, dry_run)
            .map_err(|e| Self::command_error(package, e))?;
        executor
            .execute(&self.command, &Self::publish_args(tag, otp))
            .await
            .map_err(|e| Self::command_error(package, e))?;
        Ok(())
    }

    async fn dist_tags(
        &self,
        package: &str,
        working_dir: &Path,
    ) -> Result<DistTags, PublishError> {
        match &self.query {
            QuerySource::Http(client) => client.fetch(package).await,
            QuerySource::Cli => {
                let executor = self
                    .executor(working_dir, false)
                    .map_err(|e| Self::command_error(package, e))?;
                let stdout = executor
                    .read(&self.command, &Self::dist_tags_args(package))
                    .await
                    .map_err(|e| PublishError::RegistryQuery {
                        package: package.to_string(),
                        message: e.to_string(),
                    })?;
                Self::parse_dist_tags(package, &stdout)
            }
        }
    }

    async fn add_dist_tag(
        &self,
        package: &str,
        package_dir: &Path,
        version: &str,
        tag: &str,
        otp: Option<&Otp>,
        dry_run: bool,
    ) -> Result<(), PublishError> {
        let executor = self
            .executor(package_dir, dry_run)
            .map_err(|e| Self::command_error(package, e))?;
        executor
            .execute(
                &self.command,
                &Self::dist_tag_add_args(package, version, tag, otp),
            )
            .await
            .map_err(|e| Self::command_error(package, e))?;
        Ok(())
    }
}
