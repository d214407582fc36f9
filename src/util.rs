// Utility helpers for parsing, rounding and display formatting.
//
// This module centralizes all the "dirty" CSV/number/date handling so the
// rest of the code can assume clean, typed values.
use chrono::{NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in spreadsheet exports.
///
/// - Accepts `Option<&str>` so callers can pass through optional fields.
/// - Trims whitespace and a leading `$`.
/// - Rejects values that contain alphabetic characters.
/// - Strips thousands separators like `","` before parsing.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    let s = s.strip_prefix('$').unwrap_or(s).trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace(",", "");
    s.parse::<f64>().ok()
}

/// Parse a whole number. Spreadsheet exports often write integers as `29.0`,
/// so an integral float is accepted; `29.5` is not.
pub fn parse_whole_safe(s: Option<&str>) -> Option<i64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    let f = s.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Parse an airing timestamp in any of the layouts the exports are known to
/// use. A bare date is taken as midnight.
pub fn parse_datetime_safe(s: Option<&str>) -> Option<NaiveDateTime> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ts);
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// `numerator / denominator`, or `None` when the denominator is zero.
pub fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    let v = numerator / denominator;
    v.is_finite().then_some(v)
}

/// Round to a fixed number of decimals, ties to even.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round_ties_even() / scale
}

/// Round to the nearest integer (ties to even) and coerce to `i64`.
pub fn round_to_int(value: f64) -> i64 {
    value.round_ties_even() as i64
}

/// Human-readable form of a network label: `fox_news` becomes `Fox News` and
/// `a&e` becomes `A&E`. A word starts after any character that is not a letter.
pub fn title_case(label: &str) -> String {
    let spaced = label.replace('_', " ");
    let mut out = String::with_capacity(spaced.len());
    let mut after_letter = false;
    for (i, word) in spaced.split_whitespace().enumerate() {
        if i > 0 {
            out.push(' ');
            after_letter = false;
        }
        for c in word.chars() {
            if after_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            after_letter = c.is_alphabetic();
        }
    }
    out
}

/// Fixed decimals with `en` thousands grouping: `1234.5` at 2 is `1,234.50`.
/// A value that rounds to zero never carries a sign.
pub fn format_amount(value: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, value.abs());
    let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let grouped = whole
        .parse::<u64>()
        .map(|w| w.to_formatted_string(&Locale::en))
        .unwrap_or_else(|_| whole.to_string());
    let sign = if value < 0.0 && fixed.bytes().any(|b| matches!(b, b'1'..=b'9')) {
        "-"
    } else {
        ""
    };
    if frac.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{frac}")
    }
}

pub fn format_count<T: ToFormattedString>(n: T) -> String {
    n.to_formatted_string(&Locale::en)
}

// Cell renderers for the `tabled` previews. Each prints a value at the
// precision it was rounded to.

pub fn display_count(n: &i64) -> String {
    format_count(*n)
}

pub fn display_money(n: &f64) -> String {
    format_amount(*n, 2)
}

/// Conversion rates, one decimal.
pub fn display_rate(v: &Option<f64>) -> String {
    v.map_or_else(|| "n/a".to_string(), |v| format_amount(v, 1))
}

/// Costs and percentages, two decimals.
pub fn display_metric(v: &Option<f64>) -> String {
    v.map_or_else(|| "n/a".to_string(), |v| format_amount(v, 2))
}

pub fn display_ticker(v: &Option<String>) -> String {
    v.clone().unwrap_or_default()
}
