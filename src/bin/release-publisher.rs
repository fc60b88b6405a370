//! Release Publisher CLI
//!
//! Publishes a release's packages to npm and verifies the dist-tags

use anyhow::Result;
use clap::{Parser, Subcommand};
use release_publisher::core::{ConfigLoadOptions, ConfigLoader, PublishError, TagPlan};
use release_publisher::telemetry::{LogOptions, init_logging};
use release_publisher::{Otp, PublishRequest, Publisher};
use std::path::PathBuf;
use std::process;

/// Publish release packages to the npm registry
#[derive(Parser)]
#[command(name = "release-publisher")]
#[command(version)]
#[command(about = "Publish release packages to the npm registry", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish built packages and verify their dist-tags
    Publish {
        /// Package names, as laid out under the build directory
        #[arg(value_name = "PACKAGE", required = true)]
        packages: Vec<String>,

        /// Release version
        #[arg(long)]
        version: String,

        /// Release working directory
        #[arg(long, default_value = ".")]
        cwd: PathBuf,

        /// Distribution tag (defaults to latest, or next for prereleases)
        #[arg(long)]
        tag: Option<String>,

        /// 2FA one-time password
        #[arg(long)]
        otp: Option<String>,

        /// Run the registry commands in dry-run mode and skip verification
        #[arg(long)]
        dry_run: bool,

        /// Config file (defaults to .publish-config.yaml in --cwd)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Kill registry commands that run longer than this many seconds
        #[arg(long, value_name = "SECS")]
        command_timeout: Option<u64>,

        /// Print the run summary as JSON once publishing succeeds
        #[arg(long)]
        json: bool,

        /// Emit logs as JSON lines
        #[arg(long)]
        json_logs: bool,

        /// Verbose logging
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the tag a version would be published under
    ResolveTag {
        /// Release version
        #[arg(long)]
        version: String,

        /// Requested tag
        #[arg(long)]
        tag: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let result = run().await;

    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("\n❌ Error");
            eprintln!("{:#}", e);
            process::exit(1);
        }
    }
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Publish {
            packages,
            version,
            cwd,
            tag,
            otp,
            dry_run,
            config,
            command_timeout,
            json,
            json_logs,
            verbose,
        } => {
            init_logging(LogOptions {
                json: json_logs,
                verbose,
            });

            let request = PublishRequest::new(cwd, version, packages)
                .with_otp(otp.and_then(Otp::new))
                .dry_run(dry_run);
            let request = match tag {
                Some(tag) => request.with_tag(tag),
                None => request,
            };

            publish_command(request, config, command_timeout, json).await
        }
        Commands::ResolveTag { version, tag } => resolve_tag_command(&version, tag.as_deref()),
    }
}

async fn publish_command(
    request: PublishRequest,
    config_file: Option<PathBuf>,
    command_timeout: Option<u64>,
    json: bool,
) -> Result<i32> {
    let mut options = ConfigLoadOptions::new(&request.working_directory);
    options.config_file = config_file;

    let mut config = match ConfigLoader::load(options).await {
        Ok(config) => config,
        Err(e) => {
            report_error(&e);
            return Ok(1);
        }
    };
    if command_timeout.is_some() {
        config.command_timeout_secs = command_timeout;
        ConfigLoader::validate(&config)?;
    }

    let publisher = Publisher::from_config(config)?;

    match publisher.publish(request).await {
        Ok(summary) if json => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(0)
        }
        Ok(summary) => {
            for package in &summary.packages {
                let status = if summary.dry_run {
                    "dry-run"
                } else if package.advanced_next {
                    "verified, next updated"
                } else {
                    "verified"
                };
                println!(
                    "  📦 {}@{} → {} ({})",
                    package.package, package.version, summary.tag, status
                );
            }
            Ok(0)
        }
        Err(e) => {
            report_error(&e);
            Ok(1)
        }
    }
}

fn resolve_tag_command(version: &str, tag: Option<&str>) -> Result<i32> {
    match TagPlan::resolve(version, tag) {
        Ok(plan) => {
            println!("{}", plan.tag);
            Ok(0)
        }
        Err(e) => {
            report_error(&e);
            Ok(1)
        }
    }
}

fn report_error(error: &PublishError) {
    eprintln!("\n{}", error);

    let actions = error.suggested_actions();
    if !actions.is_empty() {
        eprintln!("\n💡 Suggested actions:");
        for action in actions {
            eprintln!("  - {}", action);
        }
    }
}
