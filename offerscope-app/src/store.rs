//! JSON-file offer store.
//!
//! The file holds the normalized offers, the time they were last appended to,
//! and an optional `pending` batch: offers that were scraped but not yet
//! normalized. Stored offers are only ever appended to; a pending batch is
//! cleared only once its normalized offers have been committed.
use chrono::{DateTime, Utc};
use offerscope_common::{Offer, OfferId, OfferToBeFormatted};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("store file {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingBatch {
    pub offers: Vec<OfferToBeFormatted>,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreState {
    #[serde(default)]
    pub offers: Vec<Offer>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pending: Option<PendingBatch>,
}

pub struct JsonOfferStore {
    path: PathBuf,
    state: StoreState,
}

impl JsonOfferStore {
    /// Load the store at `path`; a missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let state = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StoreError::Json {
                path: path.clone(),
                source,
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => StoreState::default(),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        tracing::debug!(
            path = %path.display(),
            offers = state.offers.len(),
            pending = state.pending.as_ref().map_or(0, |p| p.offers.len()),
            "store.opened"
        );
        Ok(Self { path, state })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn offers(&self) -> &[Offer] {
        &self.state.offers
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.state.last_updated
    }

    pub fn pending(&self) -> &[OfferToBeFormatted] {
        self.state
            .pending
            .as_ref()
            .map(|batch| batch.offers.as_slice())
            .unwrap_or_default()
    }

    /// Ids that should not be scraped again: stored offers plus the pending batch.
    pub fn known_ids(&self) -> HashSet<OfferId> {
        self.state
            .offers
            .iter()
            .map(|o| o.id.clone())
            .chain(self.pending().iter().map(|o| o.id.clone()))
            .collect()
    }

    /// Add scraped offers to the pending batch, skipping ids already pending.
    /// Returns how many were added.
    pub fn stage_pending(&mut self, scraped: Vec<OfferToBeFormatted>) -> Result<usize, StoreError> {
        let batch = self.state.pending.get_or_insert_with(PendingBatch::default);
        let mut seen: HashSet<OfferId> = batch.offers.iter().map(|o| o.id.clone()).collect();
        let before = batch.offers.len();
        batch
            .offers
            .extend(scraped.into_iter().filter(|o| seen.insert(o.id.clone())));
        let added = batch.offers.len() - before;
        batch.last_updated = Some(Utc::now());
        if batch.offers.is_empty() {
            self.state.pending = None;
        }
        self.save()?;
        tracing::info!(added, pending = self.pending().len(), "store.pending.staged");
        Ok(added)
    }

    /// Append normalized offers and drop the pending batch.
    ///
    /// Offers whose id is already stored are skipped; existing entries are
    /// never rewritten. Returns how many offers were appended.
    pub fn commit(&mut self, normalized: Vec<Offer>) -> Result<usize, StoreError> {
        let mut seen: HashSet<OfferId> = self.state.offers.iter().map(|o| o.id.clone()).collect();
        let before = self.state.offers.len();
        self.state
            .offers
            .extend(normalized.into_iter().filter(|o| seen.insert(o.id.clone())));
        let appended = self.state.offers.len() - before;
        self.state.pending = None;
        self.state.last_updated = Some(Utc::now());
        self.save()?;
        tracing::info!(appended, total = self.state.offers.len(), "store.offers.committed");
        Ok(appended)
    }

    /// Write through a sibling temp file and rename it over the store.
    fn save(&self) -> Result<(), StoreError> {
        let io = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io)?;
        }
        let body = serde_json::to_vec_pretty(&self.state).map_err(|source| StoreError::Json {
            path: self.path.clone(),
            source,
        })?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, body).map_err(io)?;
        std::fs::rename(&tmp, &self.path).map_err(io)?;
        Ok(())
    }
}
