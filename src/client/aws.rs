//! AWS Secrets Manager client.

use super::SecretVersionClient;
use crate::config::PruneConfig;
use crate::models::{VersionEntry, VersionPage};
use crate::{Error, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::meta::region::RegionProviderChain;
use aws_sdk_secretsmanager::Client;
use aws_sdk_secretsmanager::config::Region;
use aws_sdk_secretsmanager::error::DisplayErrorContext;
use aws_sdk_secretsmanager::primitives::DateTime as SmithyDateTime;
use chrono::{DateTime, Utc};
use tracing::debug;

/// Region used when neither the configuration nor the environment names one.
pub const DEFAULT_REGION: &str = "us-east-1";

/// [`SecretVersionClient`] backed by `aws-sdk-secretsmanager`.
///
/// Listing maps to `ListSecretVersionIds` with `IncludeDeprecated=true`;
/// removal maps to `UpdateSecretVersionStage` with `RemoveFromVersionId`.
#[derive(Debug, Clone)]
pub struct SecretsManagerClient {
    client: Client,
}

impl SecretsManagerClient {
    /// Wraps an already configured SDK client.
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a client from the run configuration.
    ///
    /// Region resolution: the configured region, then the SDK default
    /// provider chain (`AWS_REGION`, profile, IMDS), then [`DEFAULT_REGION`].
    /// Credentials always come from the default provider chain.
    pub async fn from_config(config: &PruneConfig) -> Self {
        let region = RegionProviderChain::first_try(config.region.clone().map(Region::new))
            .or_default_provider()
            .or_else(DEFAULT_REGION);

        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region);
        if let Some(endpoint) = &config.endpoint_url {
            debug!(endpoint = %endpoint, "Using custom Secrets Manager endpoint");
            loader = loader.endpoint_url(endpoint.clone());
        }

        let sdk_config = loader.load().await;
        Self::new(Client::new(&sdk_config))
    }
}

/// Converts an SDK timestamp, dropping values chrono cannot represent.
fn to_utc(value: &SmithyDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(value.secs(), value.subsec_nanos())
}

#[async_trait]
impl SecretVersionClient for SecretsManagerClient {
    async fn list_versions(
        &self,
        secret_id: &str,
        next_token: Option<&str>,
        page_size: i32,
    ) -> Result<VersionPage> {
        let output = self
            .client
            .list_secret_version_ids()
            .secret_id(secret_id)
            .include_deprecated(true)
            .max_results(page_size)
            .set_next_token(next_token.map(str::to_string))
            .send()
            .await
            .map_err(|e| Error::Collection {
                secret_id: secret_id.to_string(),
                cause: DisplayErrorContext(&e).to_string(),
            })?;

        let versions = output
            .versions()
            .iter()
            .map(|entry| {
                let version_id = entry.version_id().ok_or_else(|| Error::Collection {
                    secret_id: secret_id.to_string(),
                    cause: "listed version has no version id".to_string(),
                })?;
                Ok(VersionEntry {
                    version_id: version_id.to_string(),
                    created_date: entry.created_date().and_then(to_utc),
                    stages: entry.version_stages().to_vec(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(VersionPage {
            versions,
            next_token: output.next_token().map(str::to_string),
        })
    }

    async fn remove_stage_from_version(
        &self,
        secret_id: &str,
        stage: &str,
        version_id: &str,
    ) -> Result<()> {
        self.client
            .update_secret_version_stage()
            .secret_id(secret_id)
            .version_stage(stage)
            .remove_from_version_id(version_id)
            .send()
            .await
            .map_err(|e| Error::Mutation {
                secret_id: secret_id.to_string(),
                stage: stage.to_string(),
                version_id: version_id.to_string(),
                cause: DisplayErrorContext(&e).to_string(),
            })?;

        Ok(())
    }
}
