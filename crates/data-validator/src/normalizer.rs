//! Value Normalization
//!
//! Canonical category naming plus date and amount parsing.

use crate::table::Cell;
use chrono::NaiveDate;
use tracing::trace;

/// Canonicalize a category or column name: lowercase, every run of
/// whitespace or punctuation collapsed to a single `_`, no leading or
/// trailing `_`.
pub fn canonical_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_sep = false;
    for ch in raw.trim().chars() {
        if ch.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out
}

/// Parser for raw cell values
#[derive(Debug, Clone)]
pub struct Normalizer {
    /// `chrono` format strings tried in order
    date_formats: Vec<String>,
}

impl Normalizer {
    /// Create a new normalizer with the given date formats
    pub fn new(date_formats: Vec<String>) -> Self {
        Self { date_formats }
    }

    /// Parse a date cell
    pub fn parse_date(&self, cell: &Cell) -> Result<NaiveDate, String> {
        let text = match cell {
            Cell::Text(s) => s.trim(),
            Cell::Null => return Err("is missing".to_string()),
            Cell::Number(n) => return Err(format!("value {} is not a date", n)),
        };
        for format in &self.date_formats {
            if let Ok(date) = NaiveDate::parse_from_str(text, format) {
                return Ok(date);
            }
        }
        trace!(value = text, "no date format matched");
        Err(format!("value '{}' is not a parseable date", text))
    }

    /// Parse a finite numeric cell; text is accepted when it parses cleanly
    pub fn parse_number(&self, cell: &Cell) -> Result<f64, String> {
        let value = match cell {
            Cell::Number(n) => *n,
            Cell::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("value '{}' is not numeric", s))?,
            Cell::Null => return Err("is missing".to_string()),
        };
        if value.is_finite() {
            Ok(value)
        } else {
            Err(format!("value {} is not finite", value))
        }
    }

    /// Canonicalize a categorical cell. Integral numbers are accepted as codes.
    pub fn parse_category(&self, cell: &Cell) -> Result<String, String> {
        let canonical = match cell {
            Cell::Text(s) => canonical_name(s),
            Cell::Number(n) => match cell.as_integer() {
                Some(code) => code.to_string(),
                None => return Err(format!("value {} is not a category code", n)),
            },
            Cell::Null => return Err("is missing".to_string()),
        };
        if canonical.is_empty() {
            Err("is blank".to_string())
        } else {
            Ok(canonical)
        }
    }

    /// Account identifiers are trimmed, never canonicalized
    pub fn parse_account_id(&self, cell: &Cell) -> Result<String, String> {
        match cell {
            Cell::Text(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
            Cell::Number(n) => cell
                .as_integer()
                .map(|id| id.to_string())
                .ok_or_else(|| format!("value {} is not an integral identifier", n)),
            Cell::Null => Err("is missing".to_string()),
            other => Err(format!("value {:?} is not an account identifier", other)),
        }
    }
}
