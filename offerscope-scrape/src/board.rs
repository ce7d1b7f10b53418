//! Page Fetcher: where listing and detail documents come from.
use crate::error::FetchError;
use async_trait::async_trait;
use offerscope_common::{FileRef, OfferId};
use offerscope_http::{HttpClient, HttpError, RequestOpts};
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://isa.epfl.ch/imoniteur_ISAP/";
pub const DEFAULT_LISTING_CELL: &str = "308197177";
pub const DEFAULT_DETAIL_CELL: &str = "2742535167";

const PORTAL_CELL_PATH: &str = "!PORTAL14S.portalCell";
const FILE_ACTION_PATH: &str = "docs/!PORTAL14S.action/";

/// Source of board documents, already decoded to text.
///
/// Implementations must not retry: a failed fetch surfaces as a
/// [`FetchError`] and fails the offer it belongs to.
#[async_trait]
pub trait BoardSource: Send + Sync {
    async fn fetch_listing(&self) -> Result<String, FetchError>;

    async fn fetch_detail(&self, id: &OfferId) -> Result<String, FetchError>;
}

/// The IS-Academia job board.
///
/// ```
/// use offerscope_scrape::board::IsaBoard;
/// use offerscope_common::OfferId;
///
/// let board = IsaBoard::new("https://isa.epfl.ch/imoniteur_ISAP/").unwrap();
/// assert_eq!(
///     board.listing_url().unwrap().as_str(),
///     "https://isa.epfl.ch/imoniteur_ISAP/!PORTAL14S.portalCell?ww_k_cell=308197177"
/// );
/// let id = OfferId::new("2231412").unwrap();
/// assert_eq!(
///     board.detail_url(&id).unwrap().query(),
///     Some("ww_k_cell=2742535167&ww_i_stageview=2231412")
/// );
/// ```
#[derive(Clone)]
pub struct IsaBoard {
    client: HttpClient,
    listing_cell: String,
    detail_cell: String,
}

impl IsaBoard {
    pub fn new(base_url: &str) -> Result<Self, HttpError> {
        Ok(Self::from_client(HttpClient::new(base_url)?))
    }

    pub fn from_client(client: HttpClient) -> Self {
        Self {
            client,
            listing_cell: DEFAULT_LISTING_CELL.to_string(),
            detail_cell: DEFAULT_DETAIL_CELL.to_string(),
        }
    }

    pub fn with_cells(
        mut self,
        listing_cell: impl Into<String>,
        detail_cell: impl Into<String>,
    ) -> Self {
        self.listing_cell = listing_cell.into();
        self.detail_cell = detail_cell.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = self.client.with_timeout(timeout);
        self
    }

    pub fn listing_url(&self) -> Result<Url, HttpError> {
        let mut url = self.client.resolve(PORTAL_CELL_PATH, false)?;
        url.query_pairs_mut()
            .append_pair("ww_k_cell", &self.listing_cell);
        Ok(url)
    }

    pub fn detail_url(&self, id: &OfferId) -> Result<Url, HttpError> {
        let mut url = self.client.resolve(PORTAL_CELL_PATH, false)?;
        url.query_pairs_mut()
            .append_pair("ww_k_cell", &self.detail_cell)
            .append_pair("ww_i_stageview", id.as_str());
        Ok(url)
    }

    /// Download link for an offer attachment.
    ///
    /// ```
    /// use offerscope_scrape::board::IsaBoard;
    /// use offerscope_common::FileRef;
    ///
    /// let board = IsaBoard::new("https://isa.epfl.ch/imoniteur_ISAP/").unwrap();
    /// let url = board
    ///     .file_url(&FileRef { detail_id: "991".into(), file_name: "brief.pdf".into() })
    ///     .unwrap();
    /// assert_eq!(
    ///     url.as_str(),
    ///     "https://isa.epfl.ch/imoniteur_ISAP/docs/!PORTAL14S.action/brief.pdf\
    ///      ?ww_k_cell=2742535167&ww_x_action=FILE&ww_i_detailstage=991&ww_x_filename=brief.pdf"
    /// );
    /// ```
    pub fn file_url(&self, file: &FileRef) -> Result<Url, HttpError> {
        let mut url = self.client.resolve(FILE_ACTION_PATH, false)?;
        url.path_segments_mut()
            .map_err(|_| HttpError::Url(format!("{} cannot carry a path", self.client.base())))?
            .pop_if_empty()
            .push(&file.file_name);
        url.query_pairs_mut()
            .append_pair("ww_k_cell", &self.detail_cell)
            .append_pair("ww_x_action", "FILE")
            .append_pair("ww_i_detailstage", &file.detail_id)
            .append_pair("ww_x_filename", &file.file_name);
        Ok(url)
    }

    async fn fetch(&self, url: Result<Url, HttpError>) -> Result<String, FetchError> {
        let url = url.map_err(|source| FetchError {
            url: String::new(),
            source,
        })?;
        let opts = RequestOpts {
            allow_absolute: true,
            ..Default::default()
        };
        self.client
            .get_text(url.as_str(), opts)
            .await
            .map_err(|source| FetchError {
                url: url.to_string(),
                source,
            })
    }
}

#[async_trait]
impl BoardSource for IsaBoard {
    async fn fetch_listing(&self) -> Result<String, FetchError> {
        let page = self.fetch(self.listing_url()).await?;
        tracing::debug!(bytes = page.len(), "scrape.listing.fetched");
        Ok(page)
    }

    async fn fetch_detail(&self, id: &OfferId) -> Result<String, FetchError> {
        let page = self.fetch(self.detail_url(id)).await?;
        tracing::debug!(%id, bytes = page.len(), "scrape.detail.fetched");
        Ok(page)
    }
}
