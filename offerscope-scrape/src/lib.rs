//! Job-board scraping pipeline.
//!
//! The board publishes one listing document (a table with one `<tr id=...>`
//! per offer) and one detail document per offer. This crate fetches them,
//! pulls the offer fields out of both, and joins them into
//! [`OfferToBeFormatted`](offerscope_common::OfferToBeFormatted) records.
//!
//! - [`board`]: where documents come from ([`BoardSource`], [`IsaBoard`])
//! - [`listing`] / [`row`]: listing snapshot and per-row extraction
//! - [`detail`]: detail page extraction behind the [`DetailLookup`] capability
//! - [`assemble`]: joins row and detail data for one offer
//! - [`detect`]: finds offers not seen before
//! - [`orchestrator`]: concurrent batch scraping with progress reporting
pub mod assemble;
pub mod board;
pub mod detail;
pub mod detect;
pub mod error;
pub mod listing;
pub mod orchestrator;
pub mod row;

pub use board::{BoardSource, IsaBoard};
pub use detail::{DetailLookup, MarkupDetail};
pub use error::{ExtractionError, FetchError, ScrapeError};
pub use listing::Listing;
pub use orchestrator::{ScrapeOptions, Scraper};
