//! In-memory secret version client.
//!
//! Serves a fixed set of versions (or a scripted sequence of pages) for one
//! secret, records every call it receives, and can be told to fail specific
//! calls. Removals are applied to the stored versions, so running the pruner
//! twice against the same client sees the effect of the first run.

use super::SecretVersionClient;
use crate::models::{VersionEntry, VersionPage};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A recorded `list_versions` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListCall {
    /// Secret that was listed.
    pub secret_id: String,
    /// Continuation token passed in.
    pub next_token: Option<String>,
    /// Page size requested.
    pub page_size: i32,
}

/// A recorded `remove_stage_from_version` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalCall {
    /// Secret that was mutated.
    pub secret_id: String,
    /// Stage that was detached.
    pub stage: String,
    /// Version the stage was detached from.
    pub version_id: String,
}

/// How listing responses are produced.
#[derive(Debug)]
enum Listing {
    /// Versions are split into pages of the requested size; tokens are offsets.
    Versions(Vec<VersionEntry>),
    /// Pages are served in order exactly as scripted.
    Pages(Vec<VersionPage>),
    /// Every page is empty and carries a fresh continuation token.
    Endless,
}

#[derive(Debug)]
struct State {
    listing: Listing,
    list_calls: Vec<ListCall>,
    removals: Vec<RemovalCall>,
    list_failure: Option<(usize, String)>,
    removal_failure: Option<String>,
}

/// [`SecretVersionClient`] serving one secret from memory.
#[derive(Debug)]
pub struct InMemoryClient {
    secret_id: String,
    state: Mutex<State>,
}

impl InMemoryClient {
    /// Serves `versions`, paginated by whatever page size the caller requests.
    #[must_use]
    pub fn new(secret_id: impl Into<String>, versions: Vec<VersionEntry>) -> Self {
        Self::with_listing(secret_id, Listing::Versions(versions))
    }

    /// Serves pre-built pages in order.
    ///
    /// Page `n + 1` is served for the token carried by page `n`. Pages without
    /// a token get `page-<n>` assigned unless they are the last one, so callers
    /// can script pagination by just listing page contents.
    #[must_use]
    pub fn with_pages(secret_id: impl Into<String>, pages: Vec<Vec<VersionEntry>>) -> Self {
        let count = pages.len();
        let pages = pages
            .into_iter()
            .enumerate()
            .map(|(index, versions)| {
                let page = VersionPage::new(versions);
                if index + 1 < count {
                    page.with_next_token(format!("page-{}", index + 1))
                } else {
                    page
                }
            })
            .collect();
        Self::with_listing(secret_id, Listing::Pages(pages))
    }

    /// Serves the given pages verbatim, tokens included.
    #[must_use]
    pub fn with_raw_pages(secret_id: impl Into<String>, pages: Vec<VersionPage>) -> Self {
        Self::with_listing(secret_id, Listing::Pages(pages))
    }

    /// A listing that never ends, for exercising the page cap.
    #[must_use]
    pub fn endless(secret_id: impl Into<String>) -> Self {
        Self::with_listing(secret_id, Listing::Endless)
    }

    fn with_listing(secret_id: impl Into<String>, listing: Listing) -> Self {
        Self {
            secret_id: secret_id.into(),
            state: Mutex::new(State {
                listing,
                list_calls: Vec::new(),
                removals: Vec::new(),
                list_failure: None,
                removal_failure: None,
            }),
        }
    }

    /// Fails the listing call with the given zero-based index.
    #[must_use]
    pub fn fail_listing_at(self, call_index: usize, cause: impl Into<String>) -> Self {
        self.lock().list_failure = Some((call_index, cause.into()));
        self
    }

    /// Fails every removal call.
    #[must_use]
    pub fn fail_removal(self, cause: impl Into<String>) -> Self {
        self.lock().removal_failure = Some(cause.into());
        self
    }

    /// Returns the listing calls received so far.
    #[must_use]
    pub fn list_calls(&self) -> Vec<ListCall> {
        self.lock().list_calls.clone()
    }

    /// Returns the removal calls received so far, successful or not.
    #[must_use]
    pub fn removals(&self) -> Vec<RemovalCall> {
        self.lock().removals.clone()
    }

    /// Returns the stages currently attached to a version.
    #[must_use]
    pub fn stages_of(&self, version_id: &str) -> Vec<String> {
        let state = self.lock();
        entries(&state.listing)
            .find(|entry| entry.version_id == version_id)
            .map(|entry| entry.stages.clone())
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn collection_error(&self, cause: impl Into<String>) -> Error {
        Error::Collection {
            secret_id: self.secret_id.clone(),
            cause: cause.into(),
        }
    }
}

fn entries(listing: &Listing) -> Box<dyn Iterator<Item = &VersionEntry> + '_> {
    match listing {
        Listing::Versions(versions) => Box::new(versions.iter()),
        Listing::Pages(pages) => Box::new(pages.iter().flat_map(|page| page.versions.iter())),
        Listing::Endless => Box::new(std::iter::empty()),
    }
}

fn entries_mut(listing: &mut Listing) -> Box<dyn Iterator<Item = &mut VersionEntry> + '_> {
    match listing {
        Listing::Versions(versions) => Box::new(versions.iter_mut()),
        Listing::Pages(pages) => {
            Box::new(pages.iter_mut().flat_map(|page| page.versions.iter_mut()))
        },
        Listing::Endless => Box::new(std::iter::empty()),
    }
}

fn serve_versions(
    versions: &[VersionEntry],
    next_token: Option<&str>,
    page_size: usize,
) -> std::result::Result<VersionPage, String> {
    let start = match next_token {
        None => 0,
        Some(token) => token
            .parse::<usize>()
            .ok()
            .filter(|offset| *offset <= versions.len())
            .ok_or_else(|| format!("invalid continuation token '{token}'"))?,
    };
    let end = start.saturating_add(page_size).min(versions.len());
    let page = VersionPage::new(versions[start..end].to_vec());

    if end < versions.len() {
        Ok(page.with_next_token(end.to_string()))
    } else {
        Ok(page)
    }
}

fn serve_pages(
    pages: &[VersionPage],
    next_token: Option<&str>,
) -> std::result::Result<VersionPage, String> {
    let index = match next_token {
        None => 0,
        Some(token) => pages
            .iter()
            .position(|page| page.next_token.as_deref() == Some(token))
            .map(|previous| previous + 1)
            .ok_or_else(|| format!("invalid continuation token '{token}'"))?,
    };

    pages
        .get(index)
        .cloned()
        .ok_or_else(|| format!("no page follows continuation token {next_token:?}"))
}

#[async_trait]
impl SecretVersionClient for InMemoryClient {
    async fn list_versions(
        &self,
        secret_id: &str,
        next_token: Option<&str>,
        page_size: i32,
    ) -> Result<VersionPage> {
        let mut state = self.lock();
        let call_index = state.list_calls.len();
        state.list_calls.push(ListCall {
            secret_id: secret_id.to_string(),
            next_token: next_token.map(str::to_string),
            page_size,
        });

        if secret_id != self.secret_id {
            return Err(self.collection_error(format!("secret '{secret_id}' not found")));
        }
        if let Some((failing_index, cause)) = &state.list_failure {
            if *failing_index == call_index {
                return Err(self.collection_error(cause.clone()));
            }
        }

        let page_size = usize::try_from(page_size).unwrap_or(0).max(1);
        let served = match &state.listing {
            Listing::Versions(versions) => serve_versions(versions, next_token, page_size),
            Listing::Pages(pages) => serve_pages(pages, next_token),
            Listing::Endless => {
                Ok(VersionPage::new(Vec::new()).with_next_token(format!("endless-{call_index}")))
            },
        };

        served.map_err(|cause| self.collection_error(cause))
    }

    async fn remove_stage_from_version(
        &self,
        secret_id: &str,
        stage: &str,
        version_id: &str,
    ) -> Result<()> {
        let mut state = self.lock();
        state.removals.push(RemovalCall {
            secret_id: secret_id.to_string(),
            stage: stage.to_string(),
            version_id: version_id.to_string(),
        });

        let mutation_error = |cause: String| Error::Mutation {
            secret_id: secret_id.to_string(),
            stage: stage.to_string(),
            version_id: version_id.to_string(),
            cause,
        };

        if let Some(cause) = &state.removal_failure {
            return Err(mutation_error(cause.clone()));
        }
        if secret_id != self.secret_id {
            return Err(mutation_error(format!("secret '{secret_id}' not found")));
        }

        let entry = entries_mut(&mut state.listing)
            .find(|entry| entry.version_id == version_id)
            .ok_or_else(|| mutation_error("version not found".to_string()))?;

        let before = entry.stages.len();
        entry.stages.retain(|attached| attached != stage);
        if entry.stages.len() == before {
            return Err(mutation_error(
                "stage is not attached to the version".to_string(),
            ));
        }

        Ok(())
    }
}
