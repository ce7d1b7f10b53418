//! Common types and utilities shared across offerscope crates.
//!
//! This crate defines the offer data model, display helpers, observability
//! setup, and run identifiers used throughout the workspace. It stays
//! dependency-light so the scraping, normalization and app crates can all
//! depend on it.
//!
//! # Overview
//!
//! - [`offer`]: identifiers, portal rows, detail page data and offer records
//! - [`display`]: human-facing labels for salaries, formats and lengths
//! - [`observability`]: centralised tracing/logging initialisation
//! - [`RunId`]: correlation id attached to one scrape/normalize run
//!
//! # Examples
//!
//! ```rust
//! use offerscope_common::offer::{Format, OfferId};
//!
//! let id = OfferId::new("2231412").unwrap();
//! assert_eq!(id.as_str(), "2231412");
//! assert_eq!(Format::Internship.to_string(), "internship");
//! ```
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod display;
pub mod observability;
pub mod offer;

pub use offer::{
    Address, CompanyInfo, ContactInfo, FileRef, Format, FormattedPortalCellRow, Languages,
    Location, Offer, OfferId, OfferRecord, OfferToBeFormatted, PageData, PortalCellRow, Salary,
};

/// Correlation id for one pipeline run, attached to tracing spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Short form keeps log lines readable.
        let s = self.0.simple().to_string();
        f.write_str(&s[..8])
    }
}
