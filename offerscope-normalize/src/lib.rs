//! Location and salary normalization through the remote cleaning service.
//!
//! [`Normalizer::normalize`] turns scraped offers into normalized
//! [`Offer`](offerscope_common::Offer)s. Requests of one call share a
//! cancellation token, and [`Normalizer::normalize_once`] coalesces identical
//! concurrent batches.
pub mod client;
pub mod error;
pub mod single_flight;

pub use client::{NormalizationMode, Normalizer};
pub use error::NormalizationError;
