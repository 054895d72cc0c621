//! Stage pruning.
//!
//! This module keeps the number of manageable version-stage labels on a
//! secret at or under a threshold by removing the oldest one.
//!
//! # Overview
//!
//! A run is a straight-line batch pipeline:
//!
//! 1. [`StagePruner::collect_labels`] pages through every version of the
//!    secret (deprecated versions included) and flattens their labels.
//! 2. [`UniqueStageIndex`] drops excluded stages and keeps the newest record
//!    per stage name.
//! 3. [`pick_oldest_stage_to_deprecate`] chooses the oldest stage once the
//!    count exceeds the threshold.
//! 4. The pruner detaches that one label, unless running in dry-run mode.
//!
//! The mutation is only issued after the full listing has been collected, so
//! no decision is ever made from a partial view.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stageprune::prune::StagePruner;
//! use stageprune::{InMemoryClient, PruneConfig};
//!
//! let client = Arc::new(InMemoryClient::new("app/db", versions));
//! let config = PruneConfig::new("app/db").with_threshold(2).with_dry_run(true);
//! let pruner = StagePruner::new(client, config)?;
//!
//! // Dry run to see what would be removed
//! let result = pruner.run().await?;
//! println!("{}", result.summary());
//! ```

mod index;
mod pruner;
mod selector;

pub use index::UniqueStageIndex;
pub use pruner::StagePruner;
pub use selector::pick_oldest_stage_to_deprecate;
