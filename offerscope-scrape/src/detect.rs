//! New-Job Detector.
use crate::error::ScrapeError;
use crate::listing::Listing;
use offerscope_common::OfferId;
use std::collections::HashSet;

/// Ids on the listing that are not in `known`, in document order.
///
/// The first row is the header and never counts. A listing with no data rows
/// at all is an error even when `known` is empty; a listing whose rows are all
/// known yields an empty list.
///
/// ```
/// use offerscope_common::OfferId;
/// use offerscope_scrape::{detect::detect_new_jobs, listing::Listing};
/// use std::collections::HashSet;
///
/// let listing = Listing::parse(
///     "<table><tr><th>h</th></tr><tr id='A1'><td/></tr><tr id='A2'><td/></tr></table>",
/// );
/// let known = HashSet::from([OfferId::new("A1").unwrap()]);
/// let new = detect_new_jobs(&listing, &known).unwrap();
/// assert_eq!(new, vec![OfferId::new("A2").unwrap()]);
/// ```
pub fn detect_new_jobs(
    listing: &Listing,
    known: &HashSet<OfferId>,
) -> Result<Vec<OfferId>, ScrapeError> {
    let rows = listing.data_rows();
    if rows.is_empty() {
        return Err(ScrapeError::NoJobsFound);
    }

    let mut seen = HashSet::new();
    let mut fresh = Vec::new();
    for (position, row) in rows.iter().enumerate() {
        let Some(id) = row.id.as_deref().and_then(|raw| OfferId::new(raw).ok()) else {
            tracing::warn!(row = position + 1, "scrape.detect.row_without_id");
            continue;
        };
        if known.contains(id.as_str()) || !seen.insert(id.clone()) {
            continue;
        }
        fresh.push(id);
    }

    tracing::info!(
        rows = rows.len(),
        known = known.len(),
        new = fresh.len(),
        "scrape.detect.done"
    );
    Ok(fresh)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(ids: &[Option<&str>]) -> Listing {
        let rows: String = ids
            .iter()
            .map(|id| match id {
                Some(id) => format!("<tr id=\"{id}\"><td>x</td></tr>"),
                None => "<tr><td>x</td></tr>".to_string(),
            })
            .collect();
        Listing::parse(&format!("<table><tr><th>Titre</th></tr>{rows}</table>"))
    }

    fn ids(raw: &[&str]) -> Vec<OfferId> {
        raw.iter().map(|r| OfferId::new(*r).unwrap()).collect()
    }

    #[test]
    fn every_row_is_new_with_empty_known_set() {
        let l = listing(&[Some("1"), Some("2"), Some("3")]);
        let new = detect_new_jobs(&l, &HashSet::new()).unwrap();
        assert_eq!(new, ids(&["1", "2", "3"]));
    }

    #[test]
    fn no_data_rows_is_an_error_regardless_of_known() {
        let l = listing(&[]);
        assert!(matches!(
            detect_new_jobs(&l, &HashSet::new()),
            Err(ScrapeError::NoJobsFound)
        ));
        let known = HashSet::from_iter(ids(&["1"]));
        assert!(matches!(
            detect_new_jobs(&l, &known),
            Err(ScrapeError::NoJobsFound)
        ));
    }

    #[test]
    fn all_known_is_empty_not_an_error() {
        let l = listing(&[Some("1"), Some("2")]);
        let known = HashSet::from_iter(ids(&["1", "2"]));
        assert!(detect_new_jobs(&l, &known).unwrap().is_empty());
    }

    #[test]
    fn rows_without_id_and_duplicates_are_skipped() {
        let l = listing(&[Some("1"), None, Some(" "), Some("2"), Some("1")]);
        let new = detect_new_jobs(&l, &HashSet::new()).unwrap();
        assert_eq!(new, ids(&["1", "2"]));
    }
}
