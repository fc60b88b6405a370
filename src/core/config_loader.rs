//! Configuration file loader for release-publisher
//!
//! Priority (high to low):
//! 1. CLI arguments (applied by the caller after loading)
//! 2. Environment variables
//! 3. Project config (`<cwd>/.publish-config.yaml` or an explicit path)
//! 4. Default values

use super::config::*;
use crate::core::error::PublishError;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Configuration file name
pub const CONFIG_FILENAME: &str = ".publish-config.yaml";

lazy_static! {
    /// Environment variable pattern (${VAR_NAME})
    static ref ENV_VAR_PATTERN: Regex = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();
}

/// Configuration load options
#[derive(Debug, Clone, Default)]
pub struct ConfigLoadOptions {
    /// Project path to look for `.publish-config.yaml` in
    pub project_path: PathBuf,

    /// Explicit config file; it must exist when given
    pub config_file: Option<PathBuf>,

    /// Environment variables
    pub env: HashMap<String, String>,
}

impl ConfigLoadOptions {
    pub fn new(project_path: impl Into<PathBuf>) -> Self {
        Self {
            project_path: project_path.into(),
            config_file: None,
            env: std::env::vars().collect(),
        }
    }
}

/// Configuration file loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from the file and environment, then validate it
    pub async fn load(options: ConfigLoadOptions) -> Result<PublisherConfig, PublishError> {
        let mut config = match &options.config_file {
            Some(path) => Self::load_config_file(path, &options.env)
                .await?
                .ok_or_else(|| {
                    PublishError::ConfigError(format!(
                        "Config file not found: {}",
                        path.display()
                    ))
                })?,
            None => {
                let path = options.project_path.join(CONFIG_FILENAME);
                Self::load_config_file(&path, &options.env)
                    .await?
                    .unwrap_or_default()
            }
        };

        Self::apply_env(&mut config, &options.env)?;
        Self::validate(&config)?;

        Ok(config)
    }

    /// Load configuration from a YAML file, expanding `${VAR}` references
    async fn load_config_file(
        file_path: &Path,
        env: &HashMap<String, String>,
    ) -> Result<Option<PublisherConfig>, PublishError> {
        if !file_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(file_path).await.map_err(|e| {
            PublishError::ConfigError(format!("Failed to read config file: {}", e))
        })?;

        let expanded = Self::expand_env_vars(&content, env);
        if expanded.trim().is_empty() {
            return Ok(Some(PublisherConfig::default()));
        }

        let config: PublisherConfig = serde_yaml::from_str(&expanded).map_err(|e| {
            PublishError::ConfigError(format!("Failed to parse YAML config: {}", e))
        })?;

        tracing::debug!(path = %file_path.display(), "loaded config file");
        Ok(Some(config))
    }

    /// Apply environment overrides
    fn apply_env(
        config: &mut PublisherConfig,
        env: &HashMap<String, String>,
    ) -> Result<(), PublishError> {
        // PUBLISH_REGISTRY_COMMAND -> registry.command
        if let Some(command) = env.get("PUBLISH_REGISTRY_COMMAND") {
            config.registry.command = command.clone();
        }

        // PUBLISH_REGISTRY_URL -> registry.url
        if let Some(url) = env.get("PUBLISH_REGISTRY_URL") {
            config.registry.url = url.clone();
        }

        // PUBLISH_PROPAGATION_DELAY -> verification.propagationDelaySecs
        if let Some(delay) = env.get("PUBLISH_PROPAGATION_DELAY") {
            config.verification.propagation_delay_secs =
                Self::parse_secs("PUBLISH_PROPAGATION_DELAY", delay)?;
        }

        // PUBLISH_COMMAND_TIMEOUT -> commandTimeoutSecs
        if let Some(timeout) = env.get("PUBLISH_COMMAND_TIMEOUT") {
            config.command_timeout_secs =
                Some(Self::parse_secs("PUBLISH_COMMAND_TIMEOUT", timeout)?);
        }

        Ok(())
    }

    fn parse_secs(name: &str, value: &str) -> Result<u64, PublishError> {
        value.trim().parse().map_err(|_| {
            PublishError::ConfigError(format!(
                "{} must be a whole number of seconds, got `{}`",
                name, value
            ))
        })
    }

    /// Expand `${VAR}` references; unknown variables are left untouched
    fn expand_env_vars(input: &str, env: &HashMap<String, String>) -> String {
        ENV_VAR_PATTERN
            .replace_all(input, |caps: &Captures| match env.get(&caps[1]) {
                Some(value) => value.clone(),
                None => {
                    tracing::warn!(variable = &caps[1], "environment variable not set");
                    caps[0].to_string()
                }
            })
            .into_owned()
    }

    /// Validate a loaded configuration
    pub fn validate(config: &PublisherConfig) -> Result<(), PublishError> {
        if config.registry.command.trim().is_empty() {
            return Err(PublishError::ConfigError(
                "registry.command must not be empty".to_string(),
            ));
        }

        if config.registry.query_source == QuerySourceKind::Http
            && !(config.registry.url.starts_with("https://")
                || config.registry.url.starts_with("http://"))
        {
            return Err(PublishError::ConfigError(format!(
                "registry.url must be an http(s) URL, got `{}`",
                config.registry.url
            )));
        }

        if config.build_dir.is_absolute() {
            return Err(PublishError::ConfigError(
                "buildDir must be relative to the working directory".to_string(),
            ));
        }

        if config.verification.max_attempts == 0 {
            return Err(PublishError::ConfigError(
                "verification.maxAttempts must be at least 1".to_string(),
            ));
        }

        let multiplier = config.verification.backoff_multiplier;
        if !(multiplier.is_finite() && multiplier > 0.0) {
            return Err(PublishError::ConfigError(
                "verification.backoffMultiplier must be a positive finite number".to_string(),
            ));
        }

        if config.command_timeout_secs == Some(0) {
            return Err(PublishError::ConfigError(
                "commandTimeoutSecs must be positive when set".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn options(dir: &TempDir, env: &[(&str, &str)]) -> ConfigLoadOptions {
        ConfigLoadOptions {
            project_path: dir.path().to_path_buf(),
            config_file: None,
            env: env
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_load_without_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ConfigLoader::load(options(&dir, &[])).await.unwrap();
        assert_eq!(config, PublisherConfig::default());
    }

    #[tokio::test]
    async fn test_load_project_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILENAME),
            "buildDir: out/packages\nverification:\n  propagationDelaySecs: 10\n",
        )
        .unwrap();

        let config = ConfigLoader::load(options(&dir, &[])).await.unwrap();
        assert_eq!(config.build_dir, PathBuf::from("out/packages"));
        assert_eq!(config.verification.propagation_delay_secs, 10);
    }

    #[tokio::test]
    async fn test_env_overrides_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILENAME),
            "verification:\n  propagationDelaySecs: 10\n",
        )
        .unwrap();

        let config = ConfigLoader::load(options(
            &dir,
            &[
                ("PUBLISH_PROPAGATION_DELAY", "0"),
                ("PUBLISH_COMMAND_TIMEOUT", "90"),
                ("PUBLISH_REGISTRY_COMMAND", "pnpm"),
            ],
        ))
        .await
        .unwrap();

        assert_eq!(config.verification.propagation_delay_secs, 0);
        assert_eq!(config.command_timeout_secs, Some(90));
        assert_eq!(config.registry.command, "pnpm");
    }

    #[tokio::test]
    async fn test_invalid_env_value() {
        let dir = TempDir::new().unwrap();
        let err = ConfigLoader::load(options(&dir, &[("PUBLISH_PROPAGATION_DELAY", "soon")]))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
        assert!(err.to_string().contains("PUBLISH_PROPAGATION_DELAY"));
    }

    #[tokio::test]
    async fn test_env_expansion_in_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILENAME),
            "registry:\n  url: ${MIRROR_URL}\n  querySource: http\n",
        )
        .unwrap();

        let config = ConfigLoader::load(options(
            &dir,
            &[("MIRROR_URL", "https://npm.internal.example")],
        ))
        .await
        .unwrap();
        assert_eq!(config.registry.url, "https://npm.internal.example");
        assert_eq!(config.registry.query_source, QuerySourceKind::Http);
    }

    #[tokio::test]
    async fn test_explicit_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let mut opts = options(&dir, &[]);
        opts.config_file = Some(dir.path().join("missing.yaml"));

        let err = ConfigLoader::load(opts).await.unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[tokio::test]
    async fn test_unknown_query_source_rejected() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILENAME),
            "registry:\n  querySource: carrier-pigeon\n",
        )
        .unwrap();

        let err = ConfigLoader::load(options(&dir, &[])).await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse YAML config"));
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let mut config = PublisherConfig::default();
        config.verification.max_attempts = 0;
        assert!(ConfigLoader::validate(&config).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_multiplier() {
        let mut config = PublisherConfig::default();
        config.verification.backoff_multiplier = 0.0;
        assert!(ConfigLoader::validate(&config).is_err());

        config.verification.backoff_multiplier = f64::NAN;
        assert!(ConfigLoader::validate(&config).is_err());

        config.verification.backoff_multiplier = f64::INFINITY;
        assert!(ConfigLoader::validate(&config).is_err());
    }

    #[tokio::test]
    async fn test_infinite_multiplier_in_file_rejected() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILENAME),
            "verification:\n  maxAttempts: 2\n  backoffMultiplier: .inf\n",
        )
        .unwrap();

        let err = ConfigLoader::load(options(&dir, &[])).await.unwrap_err();
        assert!(err.to_string().contains("backoffMultiplier"));
    }

    #[test]
    fn test_validate_rejects_absolute_build_dir() {
        let mut config = PublisherConfig::default();
        config.build_dir = std::env::temp_dir();
        assert!(ConfigLoader::validate(&config).is_err());
    }

    #[test]
    fn test_expand_leaves_unknown_vars() {
        let env = HashMap::from([("A".to_string(), "1".to_string())]);
        assert_eq!(
            ConfigLoader::expand_env_vars("${A}-${B}", &env),
            "1-${B}"
        );
    }
}
