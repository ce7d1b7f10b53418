//! Row Extractor: one listing row to a [`FormattedPortalCellRow`].
//!
//! Cells are matched to fields by position only. If the board ever reorders
//! its columns the fields shift silently; there is no header-name check.
use crate::error::ExtractionError;
use crate::listing::Listing;
use offerscope_common::{Format, FormattedPortalCellRow, OfferId, PortalCellRow};

/// Listing columns, in board order.
pub const HEADERS: [&str; 10] = [
    "title",
    "company",
    "location",
    "sustainabilityLabel",
    "number",
    "format",
    "registered",
    "positions",
    "professor",
    "creationDate",
];

const PROFESSOR_PLACEHOLDERS: [&str; 2] = ["à trouver (si PDM)", "To find (if master project)"];

/// Map a format label (French or English) to the formats it stands for.
///
/// ```
/// use offerscope_common::Format;
/// use offerscope_scrape::row::parse_format;
///
/// assert_eq!(parse_format("PDM ou Stage"), vec![Format::Internship, Format::Project]);
/// assert_eq!(parse_format("Internship"), vec![Format::Internship]);
/// assert_eq!(parse_format("PDM coordonné"), vec![Format::Project]);
/// assert!(parse_format("Thèse").is_empty());
/// ```
pub fn parse_format(label: &str) -> Vec<Format> {
    match label.trim() {
        "PDM ou Stage" | "master project or Internship" => {
            vec![Format::Internship, Format::Project]
        }
        "Stage" | "Internship" => vec![Format::Internship],
        "PDM coordonné" | "PDM" | "master project" => vec![Format::Project],
        _ => Vec::new(),
    }
}

/// `None` when the cell holds the "no professor yet" placeholder.
pub fn parse_professor(cell: &str) -> Option<String> {
    let trimmed = cell.trim();
    if PROFESSOR_PLACEHOLDERS.contains(&trimmed) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_count(id: &OfferId, field: &'static str, value: &str) -> Result<u32, ExtractionError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed
        .parse::<u32>()
        .map_err(|_| ExtractionError::InvalidNumber {
            id: id.to_string(),
            field,
            value: value.to_string(),
        })
}

/// Zip cell texts against [`HEADERS`]; cells past the tenth are ignored.
pub fn portal_cell_row(id: &OfferId, cells: &[String]) -> Result<PortalCellRow, ExtractionError> {
    match cells {
        [
            title,
            company,
            location,
            sustainability_label,
            number,
            format,
            registered,
            positions,
            professor,
            creation_date,
            ..,
        ] => Ok(PortalCellRow {
            title: title.clone(),
            company: company.clone(),
            location: location.clone(),
            sustainability_label: sustainability_label.clone(),
            number: number.clone(),
            format: format.clone(),
            registered: registered.clone(),
            positions: positions.clone(),
            professor: professor.clone(),
            creation_date: creation_date.clone(),
        }),
        _ => Err(ExtractionError::ShortRow {
            id: id.to_string(),
            found: cells.len(),
            expected: HEADERS.len(),
        }),
    }
}

/// Apply label mapping, trimming and count parsing to a raw row.
pub fn format_row(
    id: &OfferId,
    raw: PortalCellRow,
) -> Result<FormattedPortalCellRow, ExtractionError> {
    Ok(FormattedPortalCellRow {
        title: raw.title.trim().to_string(),
        company: raw.company.trim().to_string(),
        location: raw.location.trim().to_string(),
        sustainability_label: raw.sustainability_label,
        number: raw.number,
        format: parse_format(&raw.format),
        registered: parse_count(id, "registered", &raw.registered)?,
        positions: parse_count(id, "positions", &raw.positions)?,
        professor: parse_professor(&raw.professor),
        creation_date: raw.creation_date,
    })
}

pub fn extract_row(
    listing: &Listing,
    id: &OfferId,
) -> Result<FormattedPortalCellRow, ExtractionError> {
    let row = listing
        .row(id.as_str())
        .ok_or_else(|| ExtractionError::RowNotFound { id: id.to_string() })?;
    let raw = portal_cell_row(id, &row.cells)?;
    format_row(id, raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> OfferId {
        OfferId::new(raw).unwrap()
    }

    fn listing_with(cells: &[&str]) -> Listing {
        let tds: String = cells.iter().map(|c| format!("<td>{c}</td>")).collect();
        Listing::parse(&format!(
            "<table><tr><th>Titre</th></tr><tr id=\"A1\">{tds}</tr></table>"
        ))
    }

    const FULL_ROW: [&str; 10] = [
        "  Data engineer ",
        " Acme SA",
        " Lausanne ",
        "",
        "STG-2024-17",
        "PDM ou Stage",
        "3",
        "1",
        "à trouver (si PDM)",
        "05.03.2024",
    ];

    #[test]
    fn full_row_is_formatted() {
        let row = extract_row(&listing_with(&FULL_ROW), &id("A1")).unwrap();
        assert_eq!(row.title, "Data engineer");
        assert_eq!(row.company, "Acme SA");
        assert_eq!(row.location, "Lausanne");
        assert_eq!(row.number, "STG-2024-17");
        assert_eq!(row.format, vec![Format::Internship, Format::Project]);
        assert_eq!(row.registered, 3);
        assert_eq!(row.positions, 1);
        assert_eq!(row.professor, None);
        assert_eq!(row.creation_date, "05.03.2024");
    }

    #[test]
    fn format_table() {
        let cases: [(&str, &[Format]); 9] = [
            ("PDM ou Stage", &[Format::Internship, Format::Project]),
            ("master project or Internship", &[Format::Internship, Format::Project]),
            ("Stage", &[Format::Internship]),
            ("Internship", &[Format::Internship]),
            ("PDM coordonné", &[Format::Project]),
            ("PDM", &[Format::Project]),
            ("master project", &[Format::Project]),
            ("", &[]),
            ("Apprentissage", &[]),
        ];
        for (label, expected) in cases {
            assert_eq!(parse_format(label), expected, "label {label:?}");
        }
    }

    #[test]
    fn professor_placeholders_in_both_locales() {
        assert_eq!(parse_professor("To find (if master project)"), None);
        assert_eq!(parse_professor(" à trouver (si PDM) "), None);
        assert_eq!(
            parse_professor("Prof. Ada Lovelace"),
            Some("Prof. Ada Lovelace".to_string())
        );
    }

    #[test]
    fn empty_counts_are_zero() {
        let mut cells = FULL_ROW;
        cells[6] = " ";
        cells[7] = "";
        let row = extract_row(&listing_with(&cells), &id("A1")).unwrap();
        assert_eq!((row.registered, row.positions), (0, 0));
    }

    #[test]
    fn invalid_count_is_an_error() {
        let mut cells = FULL_ROW;
        cells[7] = "deux";
        let err = extract_row(&listing_with(&cells), &id("A1")).unwrap_err();
        assert_eq!(
            err,
            ExtractionError::InvalidNumber {
                id: "A1".into(),
                field: "positions",
                value: "deux".into(),
            }
        );
    }

    #[test]
    fn short_row_is_an_error() {
        let err = extract_row(&listing_with(&FULL_ROW[..7]), &id("A1")).unwrap_err();
        assert!(matches!(err, ExtractionError::ShortRow { found: 7, expected: 10, .. }));
    }

    #[test]
    fn extra_cells_are_ignored() {
        let mut cells = FULL_ROW.to_vec();
        cells.push("bonus");
        let row = extract_row(&listing_with(&cells), &id("A1")).unwrap();
        assert_eq!(row.creation_date, "05.03.2024");
    }

    #[test]
    fn missing_row_is_an_error() {
        let err = extract_row(&listing_with(&FULL_ROW), &id("Z9")).unwrap_err();
        assert_eq!(err, ExtractionError::RowNotFound { id: "Z9".into() });
    }
}
