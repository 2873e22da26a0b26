//! Loose numeric parsing for the values stooq prints
//!
//! stooq abbreviates large volumes with a magnitude suffix (`1.5M`, `2k`, `3g`),
//! groups thousands with commas, and decorates percentages with `%` or
//! parentheses. Both parsers are total: a finite `f64` or `None`, never a panic.

use once_cell::sync::Lazy;
use regex::Regex;

/// `<sign?><digits>(.<digits>)?<unit>`
static SUFFIXED_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([+-]?\d+(?:\.\d+)?)([kKmMgGbB])$").expect("Failed to compile suffix regex")
});

/// Multiplier for a magnitude suffix. stooq uses `g` and `b` interchangeably for 1e9.
fn unit_multiplier(unit: &str) -> f64 {
    match unit.to_ascii_lowercase().as_str() {
        "k" => 1e3,
        "m" => 1e6,
        _ => 1e9,
    }
}

/// Parse a number that may carry thousands separators or a k/m/g/b suffix.
pub fn parse_number_loose(text: Option<&str>) -> Option<f64> {
    let trimmed = text?.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(caps) = SUFFIXED_NUMBER.captures(trimmed) {
        let n: f64 = caps[1].parse().ok()?;
        let value = n * unit_multiplier(&caps[2]);
        return value.is_finite().then_some(value);
    }

    let compact: String = trimmed
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    compact.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a percentage such as `-1.1%` or `(3.2)`.
///
/// Parentheses are stripped without negating the value; this mirrors what stooq
/// renders and may not match accounting convention.
pub fn parse_percent_loose(text: Option<&str>) -> Option<f64> {
    let mut t = text?.trim();
    if t.is_empty() {
        return None;
    }

    if t.len() >= 2 && t.starts_with('(') && t.ends_with(')') {
        t = &t[1..t.len() - 1];
    }
    if let Some(stripped) = t.strip_suffix('%') {
        t = stripped;
    }

    parse_number_loose(Some(t))
}
