//! Results reported by pruning runs.

use super::LabelRecord;
use serde::Serialize;

/// The stage/version pair a run removed, or would have removed in dry-run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovedStage {
    /// The stage label.
    pub stage: String,
    /// The version the label was attached to.
    pub version_id: String,
}

impl From<&LabelRecord> for RemovedStage {
    fn from(record: &LabelRecord) -> Self {
        Self {
            stage: record.stage.clone(),
            version_id: record.version_id.clone(),
        }
    }
}

/// Result of a single pruning run.
///
/// `trimmed` is `true` only when a label was actually detached. A dry run
/// reports the candidate in `removed` while leaving `trimmed` false.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunResult {
    /// Correlation id shared by the logs of this run.
    pub run_id: String,

    /// The secret that was inspected.
    pub secret_id: String,

    /// Whether a label was removed.
    pub trimmed: bool,

    /// The removed (or would-be removed) stage.
    pub removed: Option<RemovedStage>,

    /// Every label seen across all versions, excluded ones included.
    pub total_label_count: usize,

    /// Distinct stages that are not excluded.
    pub manageable_count: usize,

    /// Threshold the manageable count was compared against.
    pub threshold: usize,

    /// Whether this was a dry run (no changes made).
    pub dry_run: bool,

    /// Duration of the run in milliseconds.
    pub duration_ms: u64,
}

impl RunResult {
    /// Returns `true` if the manageable count exceeded the threshold.
    #[must_use]
    pub const fn has_candidate(&self) -> bool {
        self.removed.is_some()
    }

    /// Returns a human-readable summary of the run.
    #[must_use]
    pub fn summary(&self) -> String {
        let Some(removed) = &self.removed else {
            return format!(
                "No pruning needed for {}: {} manageable stages within threshold {} ({} labels checked in {}ms)",
                self.secret_id,
                self.manageable_count,
                self.threshold,
                self.total_label_count,
                self.duration_ms
            );
        };

        let action = if self.trimmed {
            "Removed"
        } else {
            "Would remove"
        };

        format!(
            "{action} stage '{}' from version {} of {}: {} manageable stages exceed threshold {} ({} labels checked in {}ms)",
            removed.stage,
            removed.version_id,
            self.secret_id,
            self.manageable_count,
            self.threshold,
            self.total_label_count,
            self.duration_ms
        )
    }
}

/// Read-only view of the manageable stages of a secret.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StageReport {
    /// The secret that was inspected.
    pub secret_id: String,

    /// Every label seen across all versions, excluded ones included.
    pub total_label_count: usize,

    /// Labels dropped because their stage is excluded.
    pub excluded_label_count: usize,

    /// Threshold used to compute `candidate`.
    pub threshold: usize,

    /// Distinct manageable stages, oldest first.
    pub stages: Vec<LabelRecord>,

    /// The stage a prune run would remove right now.
    pub candidate: Option<LabelRecord>,
}

impl StageReport {
    /// Number of distinct manageable stages.
    #[must_use]
    pub const fn manageable_count(&self) -> usize {
        self.stages.len()
    }

    /// Returns `true` if a prune run would remove a stage.
    #[must_use]
    pub const fn over_threshold(&self) -> bool {
        self.stages.len() > self.threshold
    }
}
