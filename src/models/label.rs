//! Version listing types and the per-label records derived from them.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One stage label attached to one version of a secret.
///
/// A version carrying three labels yields three records that share the
/// version id and creation timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LabelRecord {
    /// The stage label, e.g. `release-2024-05-01`.
    pub stage: String,
    /// The version the label is attached to.
    pub version_id: String,
    /// When the version was created.
    pub created_date: DateTime<Utc>,
}

impl LabelRecord {
    /// Creates a new label record.
    #[must_use]
    pub fn new(
        stage: impl Into<String>,
        version_id: impl Into<String>,
        created_date: DateTime<Utc>,
    ) -> Self {
        Self {
            stage: stage.into(),
            version_id: version_id.into(),
            created_date,
        }
    }
}

/// A secret version as returned by one listing page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VersionEntry {
    /// The version id.
    pub version_id: String,
    /// Creation timestamp, when the service reported one.
    pub created_date: Option<DateTime<Utc>>,
    /// Stage labels attached to this version. Deprecated versions have none.
    pub stages: Vec<String>,
}

impl VersionEntry {
    /// Creates a version entry with no timestamp and no labels.
    #[must_use]
    pub fn new(version_id: impl Into<String>) -> Self {
        Self {
            version_id: version_id.into(),
            ..Default::default()
        }
    }

    /// Sets the creation timestamp.
    #[must_use]
    pub const fn with_created_date(mut self, created_date: DateTime<Utc>) -> Self {
        self.created_date = Some(created_date);
        self
    }

    /// Attaches a stage label.
    #[must_use]
    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stages.push(stage.into());
        self
    }

    /// Returns the creation timestamp, or the Unix epoch when it is missing.
    ///
    /// A version without a timestamp therefore sorts as the oldest possible
    /// and is the first to be pruned.
    #[must_use]
    pub fn created_or_epoch(&self) -> DateTime<Utc> {
        self.created_date.unwrap_or(DateTime::UNIX_EPOCH)
    }

    /// Flattens this version into one record per attached stage.
    pub fn label_records(&self) -> impl Iterator<Item = LabelRecord> + '_ {
        let created_date = self.created_or_epoch();
        self.stages
            .iter()
            .map(move |stage| LabelRecord::new(stage.clone(), self.version_id.clone(), created_date))
    }
}

/// One page of a version listing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VersionPage {
    /// Versions on this page.
    pub versions: Vec<VersionEntry>,
    /// Continuation token for the next page.
    pub next_token: Option<String>,
}

impl VersionPage {
    /// Creates a final page (no continuation token).
    #[must_use]
    pub const fn new(versions: Vec<VersionEntry>) -> Self {
        Self {
            versions,
            next_token: None,
        }
    }

    /// Sets the continuation token.
    #[must_use]
    pub fn with_next_token(mut self, token: impl Into<String>) -> Self {
        self.next_token = Some(token.into());
        self
    }

    /// Returns the continuation token if another page follows.
    ///
    /// An empty token ends pagination just like a missing one.
    #[must_use]
    pub fn continuation(&self) -> Option<&str> {
        self.next_token.as_deref().filter(|token| !token.is_empty())
    }
}
