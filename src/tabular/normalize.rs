//! Text normalization for the hand-edited workbook.
//!
//! Everything that touches a cell goes through here first: header labels,
//! company names, RUC identifiers and money amounts all arrive with drifting
//! casing, stray accents, quote characters and currency formatting. All
//! functions are total; dirty input degrades to an empty string or zero,
//! never an error.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static NON_NUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\d\.\-]").unwrap());
static YEAR_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}$").unwrap());

/// A RUC is a fixed-width business registration number in this registry.
pub const RUC_WIDTH: usize = 13;

/// Replaces accented Latin characters with their base letter.
///
/// The workbook is Spanish-language data entered by hand, so the accent set
/// found in practice is small; anything outside it passes through untouched.
fn fold_diacritics(text: &str) -> String {
    text.chars()
        .map(|ch| match ch {
            'Á' | 'À' | 'Â' | 'Ä' | 'á' | 'à' | 'â' | 'ä' => 'A',
            'É' | 'È' | 'Ê' | 'Ë' | 'é' | 'è' | 'ê' | 'ë' => 'E',
            'Í' | 'Ì' | 'Î' | 'Ï' | 'í' | 'ì' | 'î' | 'ï' => 'I',
            'Ó' | 'Ò' | 'Ô' | 'Ö' | 'ó' | 'ò' | 'ô' | 'ö' => 'O',
            'Ú' | 'Ù' | 'Û' | 'Ü' | 'ú' | 'ù' | 'û' | 'ü' => 'U',
            'Ñ' | 'ñ' => 'N',
            'Ç' | 'ç' => 'C',
            other => other,
        })
        .collect()
}

/// Canonical form for header labels: trimmed, uppercased, accent-folded,
/// with internal whitespace runs collapsed to a single underscore.
///
/// "Tamaño Empresa" and "TAMANO_EMPRESA" normalize to the same token, which
/// is what makes fuzzy column lookup work across header drift.
pub fn normalize_label(text: &str) -> String {
    let folded = fold_diacritics(text.trim()).to_uppercase();
    WHITESPACE_RUN.replace_all(&folded, "_").into_owned()
}

/// Loose profile for free-text matching: case- and accent-insensitive, with
/// whitespace runs collapsed to a single space. Used for name join keys.
pub fn normalize_name(text: &str) -> String {
    let folded = fold_diacritics(text.trim()).to_uppercase();
    WHITESPACE_RUN.replace_all(&folded, " ").into_owned()
}

/// Removes the quoting and padding that spreadsheet exports wrap around RUC
/// cells. No leading-zero handling; see [`normalize_ruc`] for the join key.
pub fn clean_ruc(raw: &str) -> String {
    raw.replace('\'', "").replace('"', "").trim().to_string()
}

/// Join-key profile for RUC values: cleaned and with leading zeros stripped,
/// so "0992..." and "992..." resolve to the same company.
pub fn normalize_ruc(raw: &str) -> String {
    clean_ruc(raw).trim_start_matches('0').to_string()
}

/// Strict profile for RUC values destined for output tables.
///
/// The identifier is fixed-width; a cell that lost its leading zero to
/// numeric coercion gets it back. Values that are not purely numeric, or
/// whose length cannot plausibly be a truncated RUC, are kept as cleaned.
pub fn normalize_ruc_strict(raw: &str) -> String {
    let cleaned = clean_ruc(raw);
    let is_numeric = !cleaned.is_empty() && cleaned.chars().all(|c| c.is_ascii_digit());
    if is_numeric && cleaned.len() >= RUC_WIDTH - 3 && cleaned.len() <= RUC_WIDTH {
        format!("{:0>width$}", cleaned, width = RUC_WIDTH)
    } else {
        cleaned
    }
}

/// Permissive money parsing: strips currency symbols, thousands separators
/// and whitespace. Unparsable values coerce to zero.
pub fn parse_amount(raw: &str) -> f64 {
    let text = raw.trim();
    if text.is_empty() {
        return 0.0;
    }
    let direct = text.replace(',', "").replace('$', "").replace(' ', "");
    if let Ok(value) = direct.parse::<f64>() {
        return value;
    }
    NON_NUMERIC
        .replace_all(text, "")
        .parse::<f64>()
        .unwrap_or(0.0)
}

/// True when the first cell of a row parses as a number, the cheap signal
/// that distinguishes data rows from separators and sub-total annotations.
pub fn is_numeric_cell(raw: &str) -> bool {
    let text = raw.trim();
    !text.is_empty() && text.replace(',', "").parse::<f64>().is_ok()
}

const DATE_FORMATS: [&str; 6] = [
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%Y-%m-%d",
    "%d/%m/%y",
    "%d/%m/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

/// Extracts a calendar year from a cell that may hold a bare year or a
/// day-first date in any of the formats seen in the registry.
pub fn parse_year(raw: &str) -> Option<i32> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(year) = text.parse::<i32>() {
        return (1900..=2100).contains(&year).then_some(year);
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(chrono::Datelike::year(&date));
        }
        // Datetime formats need the full parse path
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(text, format) {
            return Some(chrono::Datelike::year(&dt.date()));
        }
    }
    None
}

/// True for normalized header labels that are exactly a 4-digit year, the
/// convention for historical revenue columns ("2019".."2023"). Labels with
/// a prefix, like the "T2023" code columns, do not qualify.
pub fn is_year_label(label: &str) -> bool {
    YEAR_LABEL.is_match(&normalize_label(label))
}
