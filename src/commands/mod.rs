//! Command handlers module.
//!
//! - `prune.rs`: one pruning pass over a secret
//! - `stages.rs`: read-only report of the manageable stages
//! - `completions.rs`: shell completion scripts

mod completions;
mod prune;
mod stages;

pub use completions::cmd_completions;
pub use prune::cmd_prune;
pub use stages::cmd_stages;

use clap::{Args, ValueEnum};
use stageprune::{ExclusionSet, PruneConfig, SecretsManagerClient, StagePruner, StagepruneConfig};
use std::sync::Arc;

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Arguments identifying the secret and the pruning policy.
///
/// Every value falls back to the environment, then the config file.
#[derive(Debug, Clone, Default, Args)]
pub struct TargetArgs {
    /// Name or ARN of the secret.
    #[arg(short, long, env = "STAGEPRUNE_SECRET_ID")]
    pub secret_id: Option<String>,

    /// Region of the secret (default: SDK provider chain, then us-east-1).
    #[arg(short, long, env = "STAGEPRUNE_REGION")]
    pub region: Option<String>,

    /// Custom service endpoint, e.g. a local emulator.
    #[arg(long, env = "STAGEPRUNE_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,

    /// Maximum number of manageable stages to keep.
    #[arg(short, long, env = "STAGEPRUNE_THRESHOLD")]
    pub threshold: Option<usize>,

    /// Comma-separated stages that are never counted or removed.
    ///
    /// Replaces the default `AWSCURRENT,AWSPENDING,AWSPREVIOUS`.
    #[arg(short, long, env = "STAGEPRUNE_EXCLUDED_STAGES")]
    pub exclude: Option<String>,

    /// Versions requested per listing page (1-100).
    #[arg(long, env = "STAGEPRUNE_PAGE_SIZE")]
    pub page_size: Option<i32>,

    /// Listing pages fetched before giving up.
    #[arg(long, env = "STAGEPRUNE_MAX_PAGES")]
    pub max_pages: Option<usize>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Merges command-line values over the config file settings.
fn resolve_config(file: &StagepruneConfig, args: &TargetArgs, dry_run: bool) -> PruneConfig {
    let mut config = PruneConfig::from_settings(&file.prune);

    if let Some(secret_id) = &args.secret_id {
        config.secret_id.clone_from(secret_id);
    }
    if let Some(region) = &args.region {
        config.region = Some(region.clone());
    }
    if let Some(endpoint_url) = &args.endpoint_url {
        config.endpoint_url = Some(endpoint_url.clone());
    }
    if let Some(threshold) = args.threshold {
        config.threshold = threshold;
    }
    if let Some(exclude) = &args.exclude {
        config.exclusions = ExclusionSet::parse_csv(exclude);
    }
    if let Some(page_size) = args.page_size {
        config.page_size = page_size;
    }
    if let Some(max_pages) = args.max_pages {
        config.max_pages = max_pages;
    }
    // Either source asking for a dry run wins.
    config.dry_run = config.dry_run || dry_run;

    config
}

/// Builds a pruner backed by the Secrets Manager client.
///
/// The configuration is validated before the SDK client is loaded.
async fn build_pruner(
    config: PruneConfig,
) -> Result<StagePruner<SecretsManagerClient>, Box<dyn std::error::Error>> {
    config.validate()?;
    let client = SecretsManagerClient::from_config(&config).await;
    Ok(StagePruner::new(Arc::new(client), config)?)
}
