use offerscope_http::HttpError;
use thiserror::Error;

/// Clone so one result can be handed to every caller of a shared request.
#[derive(Debug, Clone, Error)]
pub enum NormalizationError {
    #[error("normalization request failed: {0}")]
    Request(#[source] HttpError),
    #[error("normalization cancelled")]
    Cancelled,
    #[error("normalization misconfigured: {0}")]
    Config(String),
}

impl From<HttpError> for NormalizationError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Cancelled => Self::Cancelled,
            other => Self::Request(other),
        }
    }
}
