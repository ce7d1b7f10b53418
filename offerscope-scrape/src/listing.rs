//! Immutable snapshot of the listing ("portal cell") document.
//!
//! `scraper::Html` is neither `Send` nor `Sync`, so the markup is reduced to
//! plain rows right after parsing. The snapshot can then be shared behind an
//! `Arc` by every per-offer task of a scrape batch.
use scraper::{ElementRef, Html};

/// One `<tr>` of the listing: its `id` attribute and the text of every `<td>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingRow {
    pub id: Option<String>,
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    rows: Vec<ListingRow>,
}

impl Listing {
    /// Collect every table row in document order.
    ///
    /// ```
    /// use offerscope_scrape::listing::Listing;
    ///
    /// let listing = Listing::parse(
    ///     "<table><tr><th>Titre</th></tr><tr id='A1'><td>Data</td><td>Acme</td></tr></table>",
    /// );
    /// assert_eq!(listing.rows().len(), 2);
    /// assert_eq!(listing.data_rows().len(), 1);
    /// assert_eq!(listing.row("A1").unwrap().cells, vec!["Data", "Acme"]);
    /// ```
    pub fn parse(markup: &str) -> Self {
        let document = Html::parse_document(markup);
        let rows = document
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|el| el.value().name() == "tr")
            .map(|tr| ListingRow {
                id: tr.value().attr("id").map(str::to_string),
                cells: tr
                    .descendants()
                    .filter_map(ElementRef::wrap)
                    .filter(|el| el.value().name() == "td")
                    .map(|td| td.text().collect())
                    .collect(),
            })
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[ListingRow] {
        &self.rows
    }

    /// Every row but the first, which is the column header.
    pub fn data_rows(&self) -> &[ListingRow] {
        self.rows.get(1..).unwrap_or_default()
    }

    /// First row whose `id` attribute equals `id`.
    pub fn row(&self, id: &str) -> Option<&ListingRow> {
        self.rows.iter().find(|row| row.id.as_deref() == Some(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_has_no_rows() {
        let listing = Listing::parse("<html><body><p>Maintenance</p></body></html>");
        assert!(listing.rows().is_empty());
        assert!(listing.data_rows().is_empty());
    }

    #[test]
    fn header_only_has_no_data_rows() {
        let listing = Listing::parse("<table><tr><th>Titre</th><th>Entreprise</th></tr></table>");
        assert_eq!(listing.rows().len(), 1);
        assert!(listing.data_rows().is_empty());
    }

    #[test]
    fn cell_text_keeps_inner_markup_text_and_entities() {
        let listing = Listing::parse(
            "<table><tr><th>h</th></tr>\
             <tr id='7'><td> <a href='#'>Caf&eacute;</a> </td><td>Gen&egrave;ve</td></tr></table>",
        );
        let row = listing.row("7").unwrap();
        assert_eq!(row.cells, vec![" Café ", "Genève"]);
    }

    #[test]
    fn rows_without_id_are_kept_with_none() {
        let listing =
            Listing::parse("<table><tr><th>h</th></tr><tr><td>x</td></tr><tr id='B'><td>y</td></tr></table>");
        let ids: Vec<_> = listing.data_rows().iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec![None, Some("B".to_string())]);
    }
}
