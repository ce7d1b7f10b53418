//! Offer Assembler: joins a listing row with its detail page.
use crate::board::BoardSource;
use crate::detail::parse_page_data;
use crate::error::ScrapeError;
use crate::listing::Listing;
use crate::row::extract_row;
use offerscope_common::{
    FormattedPortalCellRow, OfferId, OfferRecord, OfferToBeFormatted, PageData,
};

/// Pure merge of the three parts of an offer.
pub fn assemble(id: OfferId, row: FormattedPortalCellRow, page: PageData) -> OfferToBeFormatted {
    OfferRecord {
        id,
        title: row.title,
        company: row.company,
        location: row.location,
        sustainability_label: row.sustainability_label,
        number: row.number,
        format: row.format,
        registered: row.registered,
        positions: row.positions,
        professor: row.professor,
        creation_date: row.creation_date,
        length: page.length,
        hiring_time: page.hiring_time,
        salary: page.salary,
        benefits: page.benefits,
        description: page.description,
        required_skills: page.required_skills,
        remarks: page.remarks,
        languages: page.languages,
        related_masters: page.related_masters,
        file: page.file,
        company_info: page.company_info,
        contact_info: page.contact_info,
    }
}

/// Row extraction on the shared listing, then this offer's own detail fetch.
///
/// The row is read first so a malformed listing fails before any network call.
pub async fn assemble_offer<B>(
    board: &B,
    listing: &Listing,
    id: &OfferId,
) -> Result<OfferToBeFormatted, ScrapeError>
where
    B: BoardSource + ?Sized,
{
    let row = extract_row(listing, id).map_err(|e| ScrapeError::extraction(id, e))?;
    let markup = board.fetch_detail(id).await?;
    let page = parse_page_data(&markup).map_err(|e| ScrapeError::extraction(id, e))?;
    Ok(assemble(id.clone(), row, page))
}
