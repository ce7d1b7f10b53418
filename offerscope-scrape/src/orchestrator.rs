//! Scrape Orchestrator: fetch the listing once, then assemble many offers
//! concurrently with progress reporting.
use crate::assemble::assemble_offer;
use crate::board::BoardSource;
use crate::detect::detect_new_jobs;
use crate::error::ScrapeError;
use crate::listing::Listing;
use futures::stream::{self, StreamExt};
use offerscope_common::{OfferId, OfferToBeFormatted};
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrapeOptions {
    /// Upper bound on concurrent detail fetches. `None` puts every offer of
    /// the batch in flight at once.
    pub max_in_flight: Option<usize>,
}

pub struct Scraper<B> {
    board: B,
    options: ScrapeOptions,
}

impl<B: BoardSource> Scraper<B> {
    pub fn new(board: B) -> Self {
        Self {
            board,
            options: ScrapeOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ScrapeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    /// Fetch and parse the listing into a shareable snapshot.
    pub async fn fetch_listing(&self) -> Result<Arc<Listing>, ScrapeError> {
        let markup = self.board.fetch_listing().await?;
        let listing = Listing::parse(&markup);
        tracing::info!(rows = listing.rows().len(), "scrape.listing.parsed");
        Ok(Arc::new(listing))
    }

    /// Ids on the board that are not in `known`.
    pub async fn detect(&self, known: &HashSet<OfferId>) -> Result<Vec<OfferId>, ScrapeError> {
        let listing = self.fetch_listing().await?;
        detect_new_jobs(&listing, known)
    }

    /// Scrape `ids` against a freshly fetched listing.
    ///
    /// `progress(total, completed)` fires with `(n, 0)` before any detail
    /// fetch, then once per finished offer. The first failure aborts the
    /// batch; no partial result is returned.
    pub async fn scrape<P>(
        &self,
        ids: &[OfferId],
        progress: P,
    ) -> Result<Vec<OfferToBeFormatted>, ScrapeError>
    where
        P: FnMut(usize, usize),
    {
        let listing = self.fetch_listing().await?;
        self.scrape_with_listing(listing, ids, progress).await
    }

    /// Fetch the listing once, detect new ids and scrape them against that
    /// same snapshot.
    pub async fn scrape_new<P>(
        &self,
        known: &HashSet<OfferId>,
        progress: P,
    ) -> Result<Vec<OfferToBeFormatted>, ScrapeError>
    where
        P: FnMut(usize, usize),
    {
        let listing = self.fetch_listing().await?;
        let ids = detect_new_jobs(&listing, known)?;
        self.scrape_with_listing(listing, &ids, progress).await
    }

    /// Scrape `ids` against an already fetched listing.
    ///
    /// Results come back in the order of `ids`, whatever order the detail
    /// fetches complete in.
    pub async fn scrape_with_listing<P>(
        &self,
        listing: Arc<Listing>,
        ids: &[OfferId],
        mut progress: P,
    ) -> Result<Vec<OfferToBeFormatted>, ScrapeError>
    where
        P: FnMut(usize, usize),
    {
        let total = ids.len();
        progress(total, 0);
        if total == 0 {
            return Ok(Vec::new());
        }

        let limit = self.options.max_in_flight.unwrap_or(total).max(1);
        tracing::info!(total, limit, "scrape.batch.start");

        let board = &self.board;
        let listing = &listing;
        let mut in_flight = stream::iter(ids.iter().enumerate())
            .map(|(slot, id)| async move {
                assemble_offer(board, listing, id)
                    .await
                    .map(|offer| (slot, offer))
            })
            .buffer_unordered(limit);

        let mut slots: Vec<Option<OfferToBeFormatted>> = (0..total).map(|_| None).collect();
        let mut completed = 0usize;
        while let Some(result) = in_flight.next().await {
            let (slot, offer) = match result {
                Ok(done) => done,
                Err(err) => {
                    tracing::warn!(completed, total, error = %err, "scrape.batch.aborted");
                    return Err(err);
                }
            };
            slots[slot] = Some(offer);
            completed += 1;
            progress(total, completed);
        }

        tracing::info!(total, "scrape.batch.done");
        Ok(slots.into_iter().flatten().collect())
    }
}
