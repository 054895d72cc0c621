//! Secret version clients.
//!
//! The pruner talks to the secrets service through the [`SecretVersionClient`]
//! trait so that the pipeline can run against scripted responses in tests.
//!
//! # Available Implementations
//!
//! | Client | Use Case |
//! |--------|----------|
//! | `SecretsManagerClient` | AWS Secrets Manager via `aws-sdk-secretsmanager` |
//! | `InMemoryClient` | Scripted pages, call recording and failure injection |
//!
//! # Error Modes
//!
//! | Operation | Error Variant |
//! |-----------|---------------|
//! | `list_versions` | `Error::Collection` |
//! | `remove_stage_from_version` | `Error::Mutation` |
//!
//! Implementations do not retry beyond what their transport does natively.

mod aws;
mod memory;

pub use aws::{DEFAULT_REGION, SecretsManagerClient};
pub use memory::{InMemoryClient, ListCall, RemovalCall};

use crate::Result;
use crate::models::VersionPage;
use async_trait::async_trait;

/// Trait for secret-versioning service clients.
///
/// # Implementor Notes
///
/// - Methods use `&self` to enable sharing via `Arc<dyn SecretVersionClient>`
/// - `list_versions` must include deprecated versions (those with no stages)
/// - A missing or empty `next_token` on the returned page ends pagination
#[async_trait]
pub trait SecretVersionClient: Send + Sync {
    /// Lists one page of versions of a secret.
    ///
    /// `next_token` is `None` for the first page. `page_size` caps the number
    /// of versions returned.
    ///
    /// # Errors
    ///
    /// Returns `Error::Collection` if the call fails or the response is malformed.
    async fn list_versions(
        &self,
        secret_id: &str,
        next_token: Option<&str>,
        page_size: i32,
    ) -> Result<VersionPage>;

    /// Detaches a stage label from a version.
    ///
    /// # Errors
    ///
    /// Returns `Error::Mutation` if the call fails.
    async fn remove_stage_from_version(
        &self,
        secret_id: &str,
        stage: &str,
        version_id: &str,
    ) -> Result<()>;
}
