//! Offer data model shared by the scraping and normalization stages.
//!
//! An offer moves through three shapes: a raw [`PortalCellRow`] plus
//! [`PageData`] pulled from the board, an [`OfferToBeFormatted`] where location
//! and salary are still free text, and finally an [`Offer`] whose location and
//! salary have been resolved by the normalization service. The last two are the
//! same generic [`OfferRecord`] with different location/salary types.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Returned when building an [`OfferId`] from an empty string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("offer identifier must not be empty")]
pub struct EmptyOfferId;

/// Stable per-offer key used for joins and deduplication.
///
/// ```
/// use offerscope_common::offer::OfferId;
///
/// assert!(OfferId::new("").is_err());
/// assert!(OfferId::new("   ").is_err());
/// let id: OfferId = "A1".parse().unwrap();
/// assert_eq!(serde_json::to_string(&id).unwrap(), "\"A1\"");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OfferId(String);

impl OfferId {
    pub fn new(raw: impl Into<String>) -> Result<Self, EmptyOfferId> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(EmptyOfferId);
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for OfferId {
    type Error = EmptyOfferId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl std::str::FromStr for OfferId {
    type Err = EmptyOfferId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl From<OfferId> for String {
    fn from(id: OfferId) -> Self {
        id.0
    }
}

impl AsRef<str> for OfferId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for OfferId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OfferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of position an offer is open for. An offer can be both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Internship,
    Project,
}

impl Format {
    /// Display order used when listing an offer's formats.
    pub const ALL: [Format; 2] = [Format::Internship, Format::Project];
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Internship => f.write_str("internship"),
            Format::Project => f.write_str("project"),
        }
    }
}

/// One resolved place. `country` is `None` when the service could not tell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    pub country: Option<String>,
}

impl Location {
    /// Fallback used when the normalization service has no entry for a raw string.
    pub fn unresolved(raw: impl Into<String>) -> Self {
        Self {
            city: raw.into(),
            country: None,
        }
    }
}

/// Normalized monthly salary.
///
/// Numbers come back from the service; strings only survive for legacy
/// values it could not parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Salary {
    Amount(f64),
    Text(String),
}

/// Required language levels as shown on the detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Languages {
    pub french: String,
    pub english: String,
    pub german: String,
}

/// Attachment published with an offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRef {
    pub detail_id: String,
    pub file_name: String,
}

/// Postal address of the hosting company.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub country: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub name: String,
    pub address: Address,
    pub website: String,
}

/// Person to reach at the company about the offer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    pub name: String,
    pub title: String,
    pub email: String,
    pub cell_phone: String,
    pub professional_phone: String,
}

/// Raw cell texts of one listing row, in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalCellRow {
    pub title: String,
    pub company: String,
    pub location: String,
    pub sustainability_label: String,
    pub number: String,
    pub format: String,
    pub registered: String,
    pub positions: String,
    pub professor: String,
    pub creation_date: String,
}

/// Listing row after label mapping, trimming and numeric coercion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedPortalCellRow {
    pub title: String,
    pub company: String,
    pub location: String,
    pub sustainability_label: String,
    pub number: String,
    pub format: Vec<Format>,
    pub registered: u32,
    pub positions: u32,
    pub professor: Option<String>,
    pub creation_date: String,
}

/// Attributes read from an offer's detail document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageData {
    pub length: String,
    pub hiring_time: String,
    pub salary: String,
    pub benefits: String,
    pub description: String,
    pub required_skills: String,
    pub remarks: String,
    pub languages: Languages,
    pub related_masters: Vec<String>,
    pub file: Option<FileRef>,
    pub company_info: Option<CompanyInfo>,
    pub contact_info: Option<ContactInfo>,
}

/// A full offer, generic over how location and salary are represented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferRecord<L, S> {
    pub id: OfferId,
    pub title: String,
    pub company: String,
    pub location: L,
    pub sustainability_label: String,
    pub number: String,
    pub format: Vec<Format>,
    pub registered: u32,
    pub positions: u32,
    pub professor: Option<String>,
    pub creation_date: String,
    pub length: String,
    pub hiring_time: String,
    pub salary: S,
    pub benefits: String,
    pub description: String,
    pub required_skills: String,
    pub remarks: String,
    pub languages: Languages,
    pub related_masters: Vec<String>,
    #[serde(default)]
    pub file: Option<FileRef>,
    #[serde(default)]
    pub company_info: Option<CompanyInfo>,
    #[serde(default)]
    pub contact_info: Option<ContactInfo>,
}

/// Scraped offer whose location and salary are still the board's free text.
pub type OfferToBeFormatted = OfferRecord<String, String>;

/// Offer after location and salary normalization.
pub type Offer = OfferRecord<Vec<Location>, Option<Salary>>;

impl<L, S> OfferRecord<L, S> {
    /// Swap the location and salary representations, keeping every other field.
    pub fn map_normalized<L2, S2>(
        self,
        location: impl FnOnce(L) -> L2,
        salary: impl FnOnce(S) -> S2,
    ) -> OfferRecord<L2, S2> {
        OfferRecord {
            id: self.id,
            title: self.title,
            company: self.company,
            location: location(self.location),
            sustainability_label: self.sustainability_label,
            number: self.number,
            format: self.format,
            registered: self.registered,
            positions: self.positions,
            professor: self.professor,
            creation_date: self.creation_date,
            length: self.length,
            hiring_time: self.hiring_time,
            salary: salary(self.salary),
            benefits: self.benefits,
            description: self.description,
            required_skills: self.required_skills,
            remarks: self.remarks,
            languages: self.languages,
            related_masters: self.related_masters,
            file: self.file,
            company_info: self.company_info,
            contact_info: self.contact_info,
        }
    }

    /// Parse the board's `DD.MM.YYYY` creation date.
    pub fn creation_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.creation_date.trim(), "%d.%m.%Y").ok()
    }

    pub fn has_format(&self, format: Format) -> bool {
        self.format.contains(&format)
    }
}
