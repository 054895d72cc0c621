//! Configuration management.
//!
//! Settings are layered, lowest precedence first:
//!
//! 1. Built-in defaults ([`PruneConfig::default`])
//! 2. The TOML config file (`--config`, or `stageprune/config.toml` in the
//!    platform config directory)
//! 3. Environment variables (`STAGEPRUNE_*`, read by the CLI)
//! 4. Command-line flags
//!
//! ```toml
//! [prune]
//! secret_id = "prod/db-password"
//! threshold = 18
//! excluded_stages = ["AWSCURRENT", "AWSPREVIOUS", "AWSPENDING"]
//!
//! [observability.logging]
//! format = "json"
//!
//! [observability.metrics]
//! enabled = true
//! push_gateway = { endpoint = "http://pushgateway:9091/metrics/job/stageprune" }
//! ```

use crate::models::ExclusionSet;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default maximum number of manageable stages.
pub const DEFAULT_THRESHOLD: usize = 18;

/// Default (and maximum) number of versions requested per listing page.
pub const DEFAULT_PAGE_SIZE: i32 = 100;

/// Largest page size the listing API accepts.
pub const MAX_PAGE_SIZE: i32 = 100;

/// Default cap on listing pages before a run gives up.
pub const DEFAULT_MAX_PAGES: usize = 10_000;

/// Configuration for one pruning run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PruneConfig {
    /// Name or ARN of the secret to prune.
    pub secret_id: String,
    /// Region override; the SDK default chain is used when absent.
    pub region: Option<String>,
    /// Endpoint override, e.g. a local emulator.
    pub endpoint_url: Option<String>,
    /// Maximum number of manageable stages before pruning triggers.
    pub threshold: usize,
    /// Report the candidate without removing it.
    pub dry_run: bool,
    /// Stages that are never counted or removed.
    pub exclusions: ExclusionSet,
    /// Versions requested per listing page.
    pub page_size: i32,
    /// Listing pages fetched before the run is aborted.
    pub max_pages: usize,
}

impl Default for PruneConfig {
    fn default() -> Self {
        Self {
            secret_id: String::new(),
            region: None,
            endpoint_url: None,
            threshold: DEFAULT_THRESHOLD,
            dry_run: false,
            exclusions: ExclusionSet::reserved(),
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

impl PruneConfig {
    /// Creates a configuration for a secret with default values.
    #[must_use]
    pub fn new(secret_id: impl Into<String>) -> Self {
        Self {
            secret_id: secret_id.into(),
            ..Self::default()
        }
    }

    /// Builds a configuration from config file settings.
    ///
    /// Fields absent from the file keep their defaults. The secret id may be
    /// empty here and supplied later by the CLI.
    #[must_use]
    pub fn from_settings(settings: &PruneSettings) -> Self {
        let defaults = Self::default();
        Self {
            secret_id: settings.secret_id.clone().unwrap_or_default(),
            region: settings.region.clone(),
            endpoint_url: settings.endpoint_url.clone(),
            threshold: settings.threshold.unwrap_or(defaults.threshold),
            dry_run: settings.dry_run.unwrap_or(defaults.dry_run),
            exclusions: settings
                .excluded_stages
                .as_ref()
                .map_or(defaults.exclusions, |stages| {
                    stages.iter().map(String::as_str).collect()
                }),
            page_size: settings.page_size.unwrap_or(defaults.page_size),
            max_pages: settings.max_pages.unwrap_or(defaults.max_pages),
        }
    }

    /// Sets the secret id.
    #[must_use]
    pub fn with_secret_id(mut self, secret_id: impl Into<String>) -> Self {
        self.secret_id = secret_id.into();
        self
    }

    /// Sets the region.
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Sets the endpoint URL.
    #[must_use]
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    /// Sets the threshold.
    #[must_use]
    pub const fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }

    /// Sets dry-run mode.
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Replaces the exclusion set.
    #[must_use]
    pub fn with_exclusions(mut self, exclusions: ExclusionSet) -> Self {
        self.exclusions = exclusions;
        self
    }

    /// Sets the listing page size.
    #[must_use]
    pub const fn with_page_size(mut self, page_size: i32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets the listing page cap.
    #[must_use]
    pub const fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Checks the configuration before any remote call is made.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the secret id is blank, the page size
    /// is outside `1..=100`, or the page cap is zero.
    pub fn validate(&self) -> Result<()> {
        if self.secret_id.trim().is_empty() {
            return Err(Error::InvalidInput(
                "secret id is required (--secret-id or STAGEPRUNE_SECRET_ID)".to_string(),
            ));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&self.page_size) {
            return Err(Error::InvalidInput(format!(
                "page size must be between 1 and {MAX_PAGE_SIZE}, got {}",
                self.page_size
            )));
        }
        if self.max_pages == 0 {
            return Err(Error::InvalidInput(
                "max pages must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Main configuration loaded from the config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StagepruneConfig {
    /// Pruning defaults.
    pub prune: PruneSettings,
    /// Logging and metrics settings.
    pub observability: ObservabilitySettings,
}

/// `[prune]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PruneSettings {
    /// Secret name or ARN.
    pub secret_id: Option<String>,
    /// Region override.
    pub region: Option<String>,
    /// Endpoint override.
    pub endpoint_url: Option<String>,
    /// Threshold.
    pub threshold: Option<usize>,
    /// Dry-run mode.
    pub dry_run: Option<bool>,
    /// Excluded stages; replaces the reserved defaults when present.
    pub excluded_stages: Option<Vec<String>>,
    /// Listing page size.
    pub page_size: Option<i32>,
    /// Listing page cap.
    pub max_pages: Option<usize>,
}

/// `[observability]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObservabilitySettings {
    /// Logging settings.
    pub logging: Option<LoggingSettings>,
    /// Metrics settings.
    pub metrics: Option<MetricsSettings>,
}

/// `[observability.logging]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingSettings {
    /// Filter directives, e.g. `info` or `stageprune=debug,warn`.
    pub level: Option<String>,
    /// Output format: `pretty` or `json`.
    pub format: Option<String>,
    /// Append logs to this file instead of stderr.
    pub file: Option<PathBuf>,
}

/// `[observability.metrics]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsSettings {
    /// Whether metrics are recorded.
    pub enabled: Option<bool>,
    /// Push gateway to send metrics to at the end of the run.
    pub push_gateway: Option<MetricsPushGatewaySettings>,
}

/// Push gateway settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsPushGatewaySettings {
    /// Push gateway endpoint URI including the job path.
    pub endpoint: Option<String>,
    /// Basic auth username.
    pub username: Option<String>,
    /// Basic auth password.
    pub password: Option<String>,
    /// Use POST (accumulate) instead of PUT (replace).
    pub use_http_post: Option<bool>,
}

impl StagepruneConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid configuration.
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| Error::OperationFailed {
            operation: "parse_config_file".to_string(),
            cause: e.to_string(),
        })
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;

        Self::from_toml(&contents)
    }

    /// Returns the default config file location, if a home directory exists.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        directories::BaseDirs::new()
            .map(|dirs| dirs.config_dir().join("stageprune").join("config.toml"))
    }

    /// Loads configuration from the default location.
    ///
    /// Returns default configuration if no config file exists there.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read or parsed.
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from_file(&path),
            _ => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_prune_config_defaults() {
        let config = PruneConfig::default();
        assert_eq!(config.threshold, 18);
        assert_eq!(config.page_size, 100);
        assert_eq!(config.max_pages, 10_000);
        assert!(!config.dry_run);
        assert_eq!(config.exclusions, ExclusionSet::reserved());
    }

    #[test]
    fn test_prune_config_builders() {
        let config = PruneConfig::new("app/db")
            .with_region("eu-west-1")
            .with_endpoint_url("http://localhost:4566")
            .with_threshold(5)
            .with_dry_run(true)
            .with_page_size(10)
            .with_max_pages(3);

        assert_eq!(config.secret_id, "app/db");
        assert_eq!(config.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.endpoint_url.as_deref(), Some("http://localhost:4566"));
        assert_eq!(config.threshold, 5);
        assert!(config.dry_run);
        assert_eq!(config.page_size, 10);
        assert_eq!(config.max_pages, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_secret() {
        let err = PruneConfig::new("   ").validate().expect_err("blank secret");
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_validate_rejects_page_size_out_of_range() {
        assert!(PruneConfig::new("s").with_page_size(0).validate().is_err());
        assert!(PruneConfig::new("s").with_page_size(101).validate().is_err());
        assert!(PruneConfig::new("s").with_page_size(1).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_page_cap() {
        assert!(PruneConfig::new("s").with_max_pages(0).validate().is_err());
    }

    #[test]
    fn test_threshold_zero_is_valid() {
        assert!(PruneConfig::new("s").with_threshold(0).validate().is_ok());
    }

    #[test]
    fn test_from_toml_full() {
        let config = StagepruneConfig::from_toml(
            r#"
            [prune]
            secret_id = "prod/api"
            threshold = 7
            dry_run = true
            excluded_stages = ["AWSCURRENT", "pinned"]

            [observability.logging]
            format = "json"

            [observability.metrics]
            enabled = true
            push_gateway = { endpoint = "http://pgw:9091/metrics/job/stageprune" }
            "#,
        )
        .expect("valid config");

        let prune = PruneConfig::from_settings(&config.prune);
        assert_eq!(prune.secret_id, "prod/api");
        assert_eq!(prune.threshold, 7);
        assert!(prune.dry_run);
        assert!(prune.exclusions.contains("pinned"));
        assert!(!prune.exclusions.contains("AWSPENDING"));
        assert_eq!(prune.page_size, DEFAULT_PAGE_SIZE);

        let logging = config.observability.logging.expect("logging section");
        assert_eq!(logging.format.as_deref(), Some("json"));
        let metrics = config.observability.metrics.expect("metrics section");
        assert_eq!(metrics.enabled, Some(true));
    }

    #[test]
    fn test_from_toml_empty_uses_defaults() {
        let config = StagepruneConfig::from_toml("").expect("empty config");
        let prune = PruneConfig::from_settings(&config.prune);
        assert_eq!(prune, PruneConfig::default());
    }

    #[test]
    fn test_from_toml_invalid() {
        let err = StagepruneConfig::from_toml("[prune]\nthreshold = \"many\"")
            .expect_err("wrong type");
        assert!(err.to_string().contains("parse_config_file"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[prune]\nsecret_id = \"from-file\"").expect("write config");

        let config = StagepruneConfig::load_from_file(file.path()).expect("load");
        assert_eq!(config.prune.secret_id.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_load_from_missing_file() {
        let err = StagepruneConfig::load_from_file(Path::new("/nonexistent/stageprune.toml"))
            .expect_err("missing file");
        assert!(err.to_string().contains("read_config_file"));
    }
}
