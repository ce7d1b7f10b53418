//! Wires the board, the scraper and the normalizer from configuration and
//! drives them against the offer store.
use crate::store::JsonOfferStore;
use anyhow::{Context, Result, bail};
use offerscope_common::{OfferId, OfferToBeFormatted, RunId};
use offerscope_config::{NormalizationModeConfig, OffersConfig};
use offerscope_normalize::{NormalizationMode, Normalizer};
use offerscope_scrape::board::BoardSource;
use offerscope_scrape::{IsaBoard, ScrapeOptions, Scraper};
use std::collections::HashSet;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// What `run` did, for the final summary line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub scraped: usize,
    pub appended: usize,
}

pub struct Pipeline<B> {
    scraper: Scraper<B>,
    normalizer: Normalizer,
    email: String,
}

pub fn build_from_config(cfg: &OffersConfig) -> Result<Pipeline<IsaBoard>> {
    let board = IsaBoard::new(&cfg.board.base_url)
        .with_context(|| format!("invalid board url {}", cfg.board.base_url))?
        .with_cells(&cfg.board.listing_cell, &cfg.board.detail_cell)
        .with_timeout(Duration::from_secs(cfg.board.timeout_secs));
    let scraper = Scraper::new(board).with_options(ScrapeOptions {
        max_in_flight: cfg.scrape.max_in_flight,
    });

    let mode = match cfg.normalization.mode {
        NormalizationModeConfig::Split => NormalizationMode::Split,
        NormalizationModeConfig::Combined => NormalizationMode::Combined,
    };
    let mut normalizer = Normalizer::new(&cfg.normalization.api_base, mode)
        .context("invalid normalization api_base")?
        .with_timeout(Duration::from_secs(cfg.normalization.timeout_secs));
    if let Some(key) = cfg.normalization.api_key.as_deref().filter(|k| !k.is_empty()) {
        normalizer = normalizer.with_api_key(key);
    }

    Ok(Pipeline::new(
        scraper,
        normalizer,
        cfg.normalization.email.clone().unwrap_or_default(),
    ))
}

impl<B: BoardSource> Pipeline<B> {
    pub fn new(scraper: Scraper<B>, normalizer: Normalizer, email: String) -> Self {
        Self {
            scraper,
            normalizer,
            email,
        }
    }

    /// Ids on the board that are neither stored nor pending.
    pub async fn detect(&self, store: &JsonOfferStore) -> Result<Vec<OfferId>> {
        Ok(self.scraper.detect(&store.known_ids()).await?)
    }

    /// Scrape new offers (or every offer on the board with `all`) into the
    /// pending batch. Returns how many offers were staged.
    ///
    /// Dropping out on `cancel` leaves the store as it was.
    pub async fn scrape(
        &self,
        store: &mut JsonOfferStore,
        all: bool,
        cancel: &CancellationToken,
    ) -> Result<usize> {
        let known = if all { HashSet::new() } else { store.known_ids() };
        let scraped = tokio::select! {
            biased;
            _ = cancel.cancelled() => bail!("scrape cancelled"),
            res = self.scraper.scrape_new(&known, report_progress) => res?,
        };
        let count = scraped.len();
        let scraped: Vec<OfferToBeFormatted> = if all {
            // `--all` may return stored ids; those stay as they are.
            let stored: HashSet<&OfferId> = store.offers().iter().map(|o| &o.id).collect();
            scraped
                .into_iter()
                .filter(|o| !stored.contains(&o.id))
                .collect()
        } else {
            scraped
        };
        tracing::info!(scraped = count, staging = scraped.len(), "pipeline.scrape.done");
        Ok(store.stage_pending(scraped)?)
    }

    /// Normalize the pending batch and append the result to the stored offers.
    ///
    /// On failure the stored offers stay untouched and the batch stays pending.
    pub async fn normalize(
        &self,
        store: &mut JsonOfferStore,
        cancel: &CancellationToken,
    ) -> Result<usize> {
        let pending = store.pending().to_vec();
        if pending.is_empty() {
            tracing::info!("pipeline.normalize.nothing_pending");
            return Ok(0);
        }
        let normalized = self
            .normalizer
            .normalize_once(&self.email, &pending, cancel)
            .await
            .with_context(|| format!("normalizing {} pending offers", pending.len()))?;
        Ok(store.commit(normalized)?)
    }

    /// Scrape new offers, then normalize everything pending and append it.
    pub async fn run(
        &self,
        store: &mut JsonOfferStore,
        cancel: &CancellationToken,
    ) -> Result<RunSummary> {
        let run_id = RunId::new();
        async {
            let scraped = self.scrape(store, false, cancel).await?;
            let appended = self.normalize(store, cancel).await?;
            tracing::info!(scraped, appended, "pipeline.run.done");
            Ok::<_, anyhow::Error>(RunSummary { scraped, appended })
        }
        .instrument(tracing::info_span!("pipeline.run", run = %run_id))
        .await
    }
}

fn report_progress(total: usize, completed: usize) {
    tracing::debug!(total, completed, "pipeline.scrape.progress");
    if total > 0 {
        eprint!("\rscraping {completed}/{total}");
        if completed == total {
            eprintln!();
        }
    }
}
