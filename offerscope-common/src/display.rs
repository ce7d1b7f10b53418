//! Human-facing labels for normalized offers.
use crate::offer::{Format, Salary};

/// Render a normalized salary the way offer lists show it.
///
/// ```
/// use offerscope_common::display::format_salary;
/// use offerscope_common::offer::Salary;
///
/// assert_eq!(format_salary(None), "Unspecified");
/// assert_eq!(format_salary(Some(&Salary::Amount(0.0))), "Unpaid");
/// assert_eq!(format_salary(Some(&Salary::Amount(4500.0))), "4500 CHF");
/// ```
pub fn format_salary(salary: Option<&Salary>) -> String {
    match salary {
        None => "Unspecified".to_string(),
        Some(Salary::Amount(v)) if *v == 0.0 => "Unpaid".to_string(),
        Some(Salary::Amount(v)) => format!("{v} CHF"),
        Some(Salary::Text(s)) if s.trim() == "0" => "Unpaid".to_string(),
        Some(Salary::Text(s)) => format!("{s} CHF"),
    }
}

pub fn format_label(format: Format) -> &'static str {
    match format {
        Format::Internship => "Internship",
        Format::Project => "Master Project",
    }
}

/// Translate the board's French length buckets; unknown labels pass through.
pub fn length_label(label: &str) -> &str {
    match label {
        "4 - 6 mois" => "4 - 6 months",
        "2 - 3 mois" => "2 - 3 months",
        "Indifférent" => "No preference",
        other => other,
    }
}
