//! # Stageprune
//!
//! Keeps the number of custom version-stage labels on a managed secret under
//! a configured threshold.
//!
//! Secrets Manager caps the number of staging labels a secret may carry
//! across all of its versions. Rotation pipelines that stamp each version with
//! a release label eventually hit that cap. Stageprune walks every version of
//! a secret (deprecated ones included), works out which labels are
//! "manageable" (not one of the reserved `AWSCURRENT`/`AWSPREVIOUS`/`AWSPENDING`
//! stages or a configured exclusion), and when there are more of them than
//! the threshold allows it detaches the oldest one.
//!
//! ## Pipeline
//!
//! 1. Collect: page through `ListSecretVersionIds` and flatten every label.
//! 2. Filter and deduplicate: drop excluded stages, keep the newest record
//!    per stage name.
//! 3. Select: pick the oldest stage when the count exceeds the threshold.
//! 4. Mutate: detach that one label, unless running in dry-run mode.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stageprune::client::SecretsManagerClient;
//! use stageprune::{PruneConfig, StagePruner};
//!
//! let config = PruneConfig::new("prod/db-password").with_threshold(10);
//! let client = SecretsManagerClient::from_config(&config).await;
//! let pruner = StagePruner::new(Arc::new(client), config)?;
//!
//! let result = pruner.run().await?;
//! println!("{}", result.summary());
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
// multiple_crate_versions is inherently crate-level (detects duplicate transitive dependencies).
// Current duplicates come from the AWS SDK and reqwest hyper stacks.
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod client;
pub mod config;
pub mod models;
pub mod observability;
pub mod prune;

// Re-exports for convenience
pub use client::{InMemoryClient, SecretVersionClient, SecretsManagerClient};
pub use config::{PruneConfig, StagepruneConfig};
pub use models::{
    ExclusionSet, LabelRecord, RemovedStage, RunResult, StageReport, VersionEntry, VersionPage,
};
pub use prune::{StagePruner, UniqueStageIndex, pick_oldest_stage_to_deprecate};

/// Error type for stageprune operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait implementations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Missing secret id, page size out of range, bad config values |
/// | `Collection` | `ListSecretVersionIds` fails or returns a malformed entry |
/// | `PaginationLimitExceeded` | The listing never stops handing out continuation tokens |
/// | `Mutation` | `UpdateSecretVersionStage` fails for the selected candidate |
/// | `OperationFailed` | Config file I/O, logging or metrics initialization fails |
///
/// Every variant is fatal for a run. Nothing is retried or downgraded to a
/// log line, and a run that returns an error never removed a label.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    ///
    /// Raised before any remote call is made when:
    /// - The secret id is empty
    /// - The page size is outside `1..=100`
    /// - The page cap is zero
    /// - A config file value cannot be interpreted
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Listing the versions of a secret failed.
    ///
    /// Raised when:
    /// - The service call fails (network, credentials, missing secret)
    /// - A listed version carries no version id
    #[error("failed to list versions of '{secret_id}': {cause}")]
    Collection {
        /// The secret being listed.
        secret_id: String,
        /// The underlying cause.
        cause: String,
    },

    /// The listing kept returning continuation tokens past the page cap.
    #[error("listing versions of '{secret_id}' did not finish after {pages} pages")]
    PaginationLimitExceeded {
        /// The secret being listed.
        secret_id: String,
        /// Number of pages fetched before giving up.
        pages: usize,
    },

    /// Detaching the selected stage from its version failed.
    #[error("failed to remove stage '{stage}' from version '{version_id}' of '{secret_id}': {cause}")]
    Mutation {
        /// The secret being pruned.
        secret_id: String,
        /// The stage that was selected for removal.
        stage: String,
        /// The version the stage was attached to.
        version_id: String,
        /// The underlying cause.
        cause: String,
    },

    /// An ambient operation failed.
    ///
    /// Raised when:
    /// - The config file cannot be read or parsed
    /// - The tracing subscriber or metrics recorder cannot be installed
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Returns `true` for failures that happened while collecting labels.
    #[must_use]
    pub const fn is_collection(&self) -> bool {
        matches!(
            self,
            Self::Collection { .. } | Self::PaginationLimitExceeded { .. }
        )
    }

    /// Returns `true` if the failure happened while removing the selected stage.
    #[must_use]
    pub const fn is_mutation(&self) -> bool {
        matches!(self, Self::Mutation { .. })
    }
}

/// Result type alias for stageprune operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidInput("secret id is required".to_string());
        assert_eq!(err.to_string(), "invalid input: secret id is required");

        let err = Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: "not found".to_string(),
        };
        assert_eq!(err.to_string(), "operation 'read_config_file' failed: not found");

        let err = Error::PaginationLimitExceeded {
            secret_id: "app/token".to_string(),
            pages: 3,
        };
        assert_eq!(
            err.to_string(),
            "listing versions of 'app/token' did not finish after 3 pages"
        );
    }

    #[test]
    fn test_error_classification() {
        let collection = Error::Collection {
            secret_id: "s".to_string(),
            cause: "throttled".to_string(),
        };
        assert!(collection.is_collection());
        assert!(!collection.is_mutation());

        let capped = Error::PaginationLimitExceeded {
            secret_id: "s".to_string(),
            pages: 10,
        };
        assert!(capped.is_collection());

        let mutation = Error::Mutation {
            secret_id: "s".to_string(),
            stage: "release-1".to_string(),
            version_id: "v1".to_string(),
            cause: "access denied".to_string(),
        };
        assert!(mutation.is_mutation());
        assert!(!mutation.is_collection());
        assert!(mutation.to_string().contains("release-1"));
    }
}
