//! Collector and mutator for a single secret.

use super::{UniqueStageIndex, pick_oldest_stage_to_deprecate};
use crate::client::SecretVersionClient;
use crate::config::PruneConfig;
use crate::models::{LabelRecord, RemovedStage, RunResult, StageReport};
use crate::{Error, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Safely converts Duration to milliseconds as u64, capping at `u64::MAX`.
#[inline]
fn duration_to_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Converts usize to f64 for metrics, capping at `u32::MAX`.
#[inline]
fn usize_to_f64(value: usize) -> f64 {
    let capped = u32::try_from(value).unwrap_or(u32::MAX);
    f64::from(capped)
}

/// Converts u64 to f64 for metrics, capping at `u32::MAX`.
#[inline]
fn u64_to_f64(value: u64) -> f64 {
    let capped = u32::try_from(value).unwrap_or(u32::MAX);
    f64::from(capped)
}

/// Prunes stale version-stage labels on one secret.
///
/// Holds the remote client and the run configuration. Each call to
/// [`run`](Self::run) is an independent, stateless invocation: it collects,
/// selects, and removes at most one label.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use stageprune::{PruneConfig, SecretsManagerClient, StagePruner};
///
/// let config = PruneConfig::new("prod/api-key");
/// let client = Arc::new(SecretsManagerClient::from_config(&config).await);
/// let pruner = StagePruner::new(client, config)?;
///
/// let result = pruner.run().await?;
/// if result.trimmed {
///     println!("{}", result.summary());
/// }
/// ```
pub struct StagePruner<C: SecretVersionClient + ?Sized> {
    /// Client for the secrets service.
    client: Arc<C>,

    /// Run configuration.
    config: PruneConfig,
}

impl<C: SecretVersionClient + ?Sized> StagePruner<C> {
    /// Creates a new pruner.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the configuration is invalid. No
    /// remote call is made in that case.
    pub fn new(client: Arc<C>, config: PruneConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { client, config })
    }

    /// Returns the run configuration.
    #[must_use]
    pub const fn config(&self) -> &PruneConfig {
        &self.config
    }

    /// Collects every label attached to every version of the secret.
    ///
    /// Pages through the listing until a response carries no continuation
    /// token. Versions without labels contribute nothing; the others
    /// contribute one record per label.
    ///
    /// # Errors
    ///
    /// Returns `Error::Collection` if any listing call fails and
    /// `Error::PaginationLimitExceeded` if the listing is still handing out
    /// tokens after `max_pages` pages. Partially collected records are
    /// discarded.
    #[instrument(
        name = "stageprune.collect",
        skip(self),
        fields(
            component = "prune",
            operation = "collect",
            secret_id = %self.config.secret_id,
            page_size = self.config.page_size
        )
    )]
    pub async fn collect_labels(&self) -> Result<Vec<LabelRecord>> {
        let secret_id = self.config.secret_id.as_str();
        let mut records = Vec::new();
        let mut next_token: Option<String> = None;
        let mut pages = 0_usize;

        loop {
            if pages >= self.config.max_pages {
                warn!(pages, "Version listing exceeded the page cap");
                metrics::counter!("stageprune_collection_failures_total").increment(1);
                return Err(Error::PaginationLimitExceeded {
                    secret_id: secret_id.to_string(),
                    pages,
                });
            }

            let page = self
                .client
                .list_versions(secret_id, next_token.as_deref(), self.config.page_size)
                .await
                .inspect_err(|_| {
                    metrics::counter!("stageprune_collection_failures_total").increment(1);
                })?;
            pages += 1;

            let before = records.len();
            for entry in &page.versions {
                records.extend(entry.label_records());
            }
            debug!(
                page = pages,
                versions = page.versions.len(),
                labels = records.len() - before,
                "Fetched version page"
            );

            match page.continuation() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        metrics::counter!("stageprune_listing_pages_total")
            .increment(u64::try_from(pages).unwrap_or(u64::MAX));
        debug!(pages, labels = records.len(), "Collected version labels");

        Ok(records)
    }

    /// Collects labels and reduces them to the unique manageable stages.
    ///
    /// # Errors
    ///
    /// Returns an error if collection fails.
    pub async fn build_index(&self) -> Result<UniqueStageIndex> {
        let records = self.collect_labels().await?;
        Ok(UniqueStageIndex::build(records, &self.config.exclusions))
    }

    /// Reports the manageable stages without changing anything.
    ///
    /// # Errors
    ///
    /// Returns an error if collection fails.
    pub async fn report(&self) -> Result<StageReport> {
        let index = self.build_index().await?;
        let candidate =
            pick_oldest_stage_to_deprecate(index.records(), self.config.threshold).cloned();

        Ok(StageReport {
            secret_id: self.config.secret_id.clone(),
            total_label_count: index.total_label_count(),
            excluded_label_count: index.excluded_label_count(),
            threshold: self.config.threshold,
            stages: index.oldest_first(),
            candidate,
        })
    }

    /// Runs one pruning pass.
    ///
    /// This method:
    /// 1. Collects every label across all versions of the secret
    /// 2. Drops excluded stages and deduplicates by stage name
    /// 3. Selects the oldest stage if the count exceeds the threshold
    /// 4. Removes it (unless `dry_run`)
    ///
    /// # Returns
    ///
    /// A `RunResult` with `trimmed = true` only if a label was removed. In
    /// dry-run mode `removed` names the would-be removal.
    ///
    /// # Errors
    ///
    /// Returns the collection error if listing fails (nothing is removed) and
    /// the mutation error unchanged if the removal call fails.
    #[instrument(
        name = "stageprune.run",
        skip(self),
        fields(
            run_id = tracing::field::Empty,
            component = "prune",
            operation = "run",
            secret_id = %self.config.secret_id,
            dry_run = self.config.dry_run,
            threshold = self.config.threshold
        )
    )]
    pub async fn run(&self) -> Result<RunResult> {
        let start = Instant::now();
        let run_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("run_id", run_id.as_str());

        let index = self.build_index().await?;
        let mut result = RunResult {
            run_id,
            secret_id: self.config.secret_id.clone(),
            total_label_count: index.total_label_count(),
            manageable_count: index.len(),
            threshold: self.config.threshold,
            dry_run: self.config.dry_run,
            ..Default::default()
        };

        match pick_oldest_stage_to_deprecate(index.records(), self.config.threshold) {
            None => {
                info!(
                    manageable_count = result.manageable_count,
                    total_label_count = result.total_label_count,
                    "Manageable stages within threshold"
                );
            },
            Some(candidate) if self.config.dry_run => {
                info!(
                    stage = %candidate.stage,
                    version_id = %candidate.version_id,
                    created_date = %candidate.created_date,
                    manageable_count = result.manageable_count,
                    "Dry run: would remove oldest stage"
                );
                result.removed = Some(RemovedStage::from(candidate));
            },
            Some(candidate) => {
                self.remove(candidate).await?;
                result.removed = Some(RemovedStage::from(candidate));
                result.trimmed = true;
            },
        }

        result.duration_ms = duration_to_millis(start.elapsed());
        record_run_metrics(&result);

        info!(
            trimmed = result.trimmed,
            manageable_count = result.manageable_count,
            total_label_count = result.total_label_count,
            duration_ms = result.duration_ms,
            "Stage prune completed"
        );

        Ok(result)
    }

    /// Detaches the candidate stage from its version.
    async fn remove(&self, candidate: &LabelRecord) -> Result<()> {
        self.client
            .remove_stage_from_version(
                &self.config.secret_id,
                &candidate.stage,
                &candidate.version_id,
            )
            .await
            .inspect_err(|e| {
                metrics::counter!("stageprune_mutation_failures_total").increment(1);
                warn!(
                    stage = %candidate.stage,
                    version_id = %candidate.version_id,
                    error = %e,
                    "Failed to remove stage"
                );
            })?;

        info!(
            stage = %candidate.stage,
            version_id = %candidate.version_id,
            created_date = %candidate.created_date,
            "Removed oldest stage"
        );
        Ok(())
    }
}

fn record_run_metrics(result: &RunResult) {
    metrics::counter!(
        "stageprune_runs_total",
        "dry_run" => result.dry_run.to_string(),
        "trimmed" => result.trimmed.to_string()
    )
    .increment(1);
    metrics::gauge!("stageprune_manageable_stages").set(usize_to_f64(result.manageable_count));
    metrics::gauge!("stageprune_total_labels").set(usize_to_f64(result.total_label_count));
    metrics::histogram!("stageprune_run_duration_ms").record(u64_to_f64(result.duration_ms));
}
