//! Detail Extractor: reads an offer's detail document into [`PageData`].
//!
//! The detail page is a flat run of `<detail c_detailmodele="KEY">` label
//! nodes, each usually followed by the element holding its value. Where the
//! value sits relative to the label differs per field, so lookups go through
//! the [`DetailLookup`] capability instead of raw DOM walking. Tests and other
//! markup flavours can supply their own implementation.
use crate::error::ExtractionError;
use offerscope_common::{Address, CompanyInfo, ContactInfo, FileRef, Languages, PageData};
use scraper::node::Node;
use scraper::{ElementRef, Html};
use url::Url;

pub const KEY_ATTR: &str = "c_detailmodele";

pub mod keys {
    pub const LENGTH: &str = "STAGE_LABEL_DUREEND1";
    pub const SALARY: &str = "STAGE_LABEL_SALAIRE";
    pub const BENEFITS: &str = "STAGE_LABEL_BENEF";
    pub const DESCRIPTION: &str = "STAGE_LABEL_DESCRIPTION";
    pub const REQUIRED_SKILLS: &str = "STAGE_LABEL_CONN_REQU";
    pub const REMARKS: &str = "STAGE_LABEL_RMQ";
    pub const HIRING_PERIODS: [&str; 3] =
        ["DETSTAGE_CHK_P1", "DETSTAGE_CHK_P2", "DETSTAGE_CHK_P3"];
    pub const FRENCH: &str = "STAGE_ETIQ_LANGUEFRANCAIS";
    pub const ENGLISH: &str = "STAGE_ETIQ_LANGUEANGLAIS";
    pub const GERMAN: &str = "STAGE_ETIQ_LANGUEALLEMAND";
    pub const SECTIONS_START: &str = "DET_STAGE_LAB_SECTIONS";
    pub const SECTIONS_END: &str = "CODE21916719";
    pub const FILE: &str = "STAGE_LABEL_FICHIER";

    pub const COMPANY_NAME: &str = "STAGE_LABEL_ENTRMERE";
    pub const COMPANY_STREET: &str = "STAGE_LABEL_ADRESSE";
    pub const COMPANY_CITY: &str = "STAGE_LABEL_LOC";
    pub const COMPANY_COUNTRY: &str = "STCC_ENTRPAYS";
    pub const COMPANY_WEBSITE: &str = "STAGE_LABEL_URL";

    pub const CONTACT_NAME: &str = "DET_STAGE_LAB_INFOSCONTACT";
    pub const CONTACT_TITLE: &str = "STAGE_LABEL_TITRE2";
    pub const CONTACT_EMAIL: &str = "STAGE_LABEL_EMAIL";
    pub const CONTACT_CELL_PHONE: &str = "STAGE_LABEL_MOBILE2";
    pub const CONTACT_PROFESSIONAL_PHONE: &str = "STAGE_LABEL_TELPROF2";
}

/// Keyed access to the values of a detail document.
///
/// "Child #1" means the second child node (text or element) of a node,
/// counting whitespace text nodes.
pub trait DetailLookup {
    /// Text of child #1 of the element right after the `key` node.
    /// Empty when that element has no child #1.
    fn text_for(&self, key: &str) -> Result<String, ExtractionError>;

    /// Text of child #1 of the `key` node itself.
    fn inline_text(&self, key: &str) -> Result<String, ExtractionError>;

    /// Non-empty child #1 texts of the elements between `from` and `until`,
    /// in document order.
    fn sibling_run(&self, from: &str, until: &str) -> Result<Vec<String>, ExtractionError>;

    /// First `href` inside the element right after the `key` node.
    fn link_for(&self, key: &str) -> Result<Option<String>, ExtractionError>;
}

/// [`DetailLookup`] over parsed board markup.
pub struct MarkupDetail {
    document: Html,
}

impl MarkupDetail {
    pub fn parse(markup: &str) -> Self {
        Self {
            document: Html::parse_document(markup),
        }
    }

    fn find(&self, key: &str) -> Result<ElementRef<'_>, ExtractionError> {
        self.document
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "detail" && el.value().attr(KEY_ATTR) == Some(key))
            .ok_or_else(|| ExtractionError::MissingKey {
                key: key.to_string(),
            })
    }
}

fn next_element(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.next_siblings().find_map(ElementRef::wrap)
}

/// Text of child #1, whitespace text nodes included in the count.
fn child_one_text(el: ElementRef<'_>) -> Option<String> {
    let child = el
        .children()
        .filter(|n| n.value().is_element() || n.value().is_text())
        .nth(1)?;
    Some(match child.value() {
        Node::Text(text) => {
            let s: &str = text;
            s.to_string()
        }
        _ => ElementRef::wrap(child)
            .map(|inner| inner.text().collect())
            .unwrap_or_default(),
    })
}

impl DetailLookup for MarkupDetail {
    fn text_for(&self, key: &str) -> Result<String, ExtractionError> {
        let label = self.find(key)?;
        let value = next_element(label).ok_or_else(|| ExtractionError::MissingChild {
            key: key.to_string(),
        })?;
        Ok(child_one_text(value).unwrap_or_default())
    }

    fn inline_text(&self, key: &str) -> Result<String, ExtractionError> {
        let label = self.find(key)?;
        child_one_text(label).ok_or_else(|| ExtractionError::MissingChild {
            key: key.to_string(),
        })
    }

    fn sibling_run(&self, from: &str, until: &str) -> Result<Vec<String>, ExtractionError> {
        let start = self.find(from)?;
        let mut texts = Vec::new();
        let mut next = next_element(start);
        loop {
            let Some(el) = next else {
                return Err(ExtractionError::UnterminatedRun {
                    from: from.to_string(),
                    until: until.to_string(),
                });
            };
            if el.value().attr(KEY_ATTR) == Some(until) {
                return Ok(texts);
            }
            if let Some(text) = child_one_text(el) {
                if !text.is_empty() {
                    texts.push(text);
                }
            }
            next = next_element(el);
        }
    }

    fn link_for(&self, key: &str) -> Result<Option<String>, ExtractionError> {
        let label = self.find(key)?;
        let Some(value) = next_element(label) else {
            return Ok(None);
        };
        Ok(value
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|el| el.value().name() == "a")
            .find_map(|el| el.value().attr("href"))
            .map(str::to_string))
    }
}

/// Treat an absent key as an empty value.
fn optional_text(
    lookup: &dyn DetailLookup,
    key: &str,
    read: fn(&dyn DetailLookup, &str) -> Result<String, ExtractionError>,
) -> Result<Option<String>, ExtractionError> {
    match read(lookup, key) {
        Ok(text) => Ok(Some(text)),
        Err(ExtractionError::MissingKey { .. }) | Err(ExtractionError::MissingChild { .. }) => {
            Ok(None)
        }
        Err(other) => Err(other),
    }
}

fn text_for(lookup: &dyn DetailLookup, key: &str) -> Result<String, ExtractionError> {
    lookup.text_for(key)
}

fn inline_text(lookup: &dyn DetailLookup, key: &str) -> Result<String, ExtractionError> {
    lookup.inline_text(key)
}

/// First non-empty hiring period, or empty when none is ticked.
fn hiring_time(lookup: &dyn DetailLookup) -> Result<String, ExtractionError> {
    for key in keys::HIRING_PERIODS {
        let text = lookup.inline_text(key)?;
        if !text.is_empty() {
            return Ok(text);
        }
    }
    Ok(String::new())
}

/// Attachment named by the link after `STAGE_LABEL_FICHIER`, if any.
fn file_ref(lookup: &dyn DetailLookup) -> Result<Option<FileRef>, ExtractionError> {
    let href = match lookup.link_for(keys::FILE) {
        Ok(Some(href)) => href,
        Ok(None) | Err(ExtractionError::MissingKey { .. }) => return Ok(None),
        Err(other) => return Err(other),
    };
    let Ok(url) = Url::parse(crate::board::DEFAULT_BASE_URL).and_then(|base| base.join(&href))
    else {
        tracing::debug!(%href, "scrape.detail.file_link_unparsable");
        return Ok(None);
    };
    let mut detail_id = None;
    let mut file_name = None;
    for (k, v) in url.query_pairs() {
        match k.as_ref() {
            "ww_i_detailstage" => detail_id = Some(v.into_owned()),
            "ww_x_filename" => file_name = Some(v.into_owned()),
            _ => {}
        }
    }
    Ok(detail_id
        .zip(file_name)
        .map(|(detail_id, file_name)| FileRef {
            detail_id,
            file_name,
        }))
}

fn company_info(lookup: &dyn DetailLookup) -> Result<Option<CompanyInfo>, ExtractionError> {
    let Some(name) = optional_text(lookup, keys::COMPANY_NAME, text_for)? else {
        return Ok(None);
    };
    let field = |key: &str| optional_text(lookup, key, text_for).map(Option::unwrap_or_default);
    Ok(Some(CompanyInfo {
        name,
        address: Address {
            street: field(keys::COMPANY_STREET)?,
            city: field(keys::COMPANY_CITY)?,
            country: optional_text(lookup, keys::COMPANY_COUNTRY, inline_text)?
                .unwrap_or_default(),
        },
        website: field(keys::COMPANY_WEBSITE)?,
    }))
}

fn contact_info(lookup: &dyn DetailLookup) -> Result<Option<ContactInfo>, ExtractionError> {
    let Some(name) = optional_text(lookup, keys::CONTACT_NAME, text_for)? else {
        return Ok(None);
    };
    let field = |key: &str| optional_text(lookup, key, text_for).map(Option::unwrap_or_default);
    Ok(Some(ContactInfo {
        name,
        title: field(keys::CONTACT_TITLE)?,
        email: field(keys::CONTACT_EMAIL)?,
        cell_phone: field(keys::CONTACT_CELL_PHONE)?,
        professional_phone: field(keys::CONTACT_PROFESSIONAL_PHONE)?,
    }))
}

/// Read every offer attribute the pipeline keeps.
///
/// Required keys missing from the document fail the whole offer. The file
/// reference and company/contact blocks are optional.
pub fn extract_page_data(lookup: &dyn DetailLookup) -> Result<PageData, ExtractionError> {
    Ok(PageData {
        length: lookup.text_for(keys::LENGTH)?,
        hiring_time: hiring_time(lookup)?,
        salary: lookup.text_for(keys::SALARY)?,
        benefits: lookup.text_for(keys::BENEFITS)?,
        description: lookup.text_for(keys::DESCRIPTION)?,
        required_skills: lookup.text_for(keys::REQUIRED_SKILLS)?,
        remarks: lookup.text_for(keys::REMARKS)?,
        languages: Languages {
            french: lookup.inline_text(keys::FRENCH)?,
            english: lookup.inline_text(keys::ENGLISH)?,
            german: lookup.inline_text(keys::GERMAN)?,
        },
        related_masters: lookup.sibling_run(keys::SECTIONS_START, keys::SECTIONS_END)?,
        file: file_ref(lookup)?,
        company_info: company_info(lookup)?,
        contact_info: contact_info(lookup)?,
    })
}

/// Parse detail markup and extract its [`PageData`] in one step.
pub fn parse_page_data(markup: &str) -> Result<PageData, ExtractionError> {
    extract_page_data(&MarkupDetail::parse(markup))
}
