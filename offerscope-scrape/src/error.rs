use offerscope_common::OfferId;
use offerscope_http::HttpError;
use thiserror::Error;

/// A listing or detail document could not be retrieved.
#[derive(Debug, Clone, Error)]
#[error("failed to fetch {url}: {source}")]
pub struct FetchError {
    pub url: String,
    #[source]
    pub source: HttpError,
}

/// The board markup did not have the shape the extractors rely on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("no listing row with id {id}")]
    RowNotFound { id: String },
    #[error("listing row {id} has {found} cells, expected at least {expected}")]
    ShortRow {
        id: String,
        found: usize,
        expected: usize,
    },
    #[error("listing row {id}: {field} is not a count: {value:?}")]
    InvalidNumber {
        id: String,
        field: &'static str,
        value: String,
    },
    #[error("detail key {key} not found")]
    MissingKey { key: String },
    #[error("detail key {key} has no value node")]
    MissingChild { key: String },
    #[error("ran out of siblings after {from} before reaching {until}")]
    UnterminatedRun { from: String, until: String },
}

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("offer {id}: {source}")]
    Extraction {
        id: OfferId,
        #[source]
        source: ExtractionError,
    },
    #[error("no jobs found on the listing")]
    NoJobsFound,
}

impl ScrapeError {
    pub(crate) fn extraction(id: &OfferId, source: ExtractionError) -> Self {
        Self::Extraction {
            id: id.clone(),
            source,
        }
    }
}
