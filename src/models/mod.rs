//! Data models for stageprune.
//!
//! This module contains the records that flow through a pruning run: listing
//! pages as the service returns them, the flattened per-label records, the
//! exclusion set, and the reports a run produces.

mod exclusion;
mod label;
mod report;

pub use exclusion::{ExclusionSet, RESERVED_STAGES};
pub use label::{LabelRecord, VersionEntry, VersionPage};
pub use report::{RemovedStage, RunResult, StageReport};
