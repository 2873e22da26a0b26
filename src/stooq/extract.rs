//! Field extraction from raw stooq quote markup
//!
//! stooq tags each live value with an element id such as `aq_gc.f_h`, frequently
//! written without quotes (`id=aq_gc.f_c2|3`). Rather than building a DOM, the page
//! is scanned with a per-identifier pattern that accepts any quoting style and keeps
//! the last occurrence, since earlier ones are often loading placeholders.

use regex::Regex;
use tracing::debug;

use crate::common::types::{RawFieldSet, Symbol};

/// Digit priority for the last-price identifier `aq_{sym}_c{d}|3`.
///
/// The digit depends on the instrument kind; this order is kept as-is for
/// compatibility with what the page publishes.
pub const LAST_PRICE_PROBE_ORDER: [u8; 10] = [2, 0, 3, 1, 4, 5, 6, 7, 8, 9];

/// Element identifiers of every non-price field for one symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIds {
    pub date: String,
    pub time: String,
    pub change: String,
    pub change_pct: String,
    pub high: String,
    pub low: String,
    pub open: String,
    pub prev: String,
    pub volume: String,
    pub turnover: String,
}

impl FieldIds {
    pub fn for_symbol(symbol: &Symbol) -> Self {
        let id = |suffix: &str| format!("aq_{}_{}", symbol, suffix);
        Self {
            date: id("d2"),
            time: id("t1"),
            change: id("m2"),
            change_pct: id("m3"),
            high: id("h"),
            low: id("l"),
            open: id("o"),
            prev: id("p"),
            volume: id("v2"),
            turnover: id("r2"),
        }
    }
}

/// Candidate last-price identifiers in probe order
pub fn last_price_candidates(symbol: &Symbol) -> Vec<String> {
    LAST_PRICE_PROBE_ORDER
        .iter()
        .map(|d| format!("aq_{}_c{}|3", symbol, d))
        .collect()
}

/// Build the matcher for one element id. The id is escaped so `.` and `|` match
/// literally.
fn id_pattern(element_id: &str) -> Option<Regex> {
    let pattern = format!(
        r#"(?i)\bid=["']?{}["']?[^>]*>([^<]*)<"#,
        regex::escape(element_id)
    );
    Regex::new(&pattern).ok()
}

/// Text of the last element carrying `element_id`, trimmed.
///
/// Returns `None` when the id does not occur at all and `Some("")` when it occurs
/// with blank content.
pub fn extract_text_by_id(markup: &str, element_id: &str) -> Option<String> {
    let pattern = id_pattern(element_id)?;
    pattern
        .captures_iter(markup)
        .last()
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Locate the last price: the first candidate id found in the page wins, even if
/// its text is blank. Returns `(matched_id, text)`.
pub fn probe_last_price(markup: &str, symbol: &Symbol) -> Option<(String, String)> {
    last_price_candidates(symbol).into_iter().find_map(|id| {
        extract_text_by_id(markup, &id).map(|text| {
            debug!(symbol = %symbol, last_id = %id, "last price identifier found");
            (id, text)
        })
    })
}

/// Extract every quote field for `symbol` from the page markup.
pub fn extract_fields(markup: &str, symbol: &Symbol) -> RawFieldSet {
    let ids = FieldIds::for_symbol(symbol);
    let field = |id: &str| extract_text_by_id(markup, id);
    let (last_id, last) = match probe_last_price(markup, symbol) {
        Some((id, text)) => (Some(id), Some(text)),
        None => (None, None),
    };

    RawFieldSet {
        last,
        last_id,
        date: field(&ids.date),
        time: field(&ids.time),
        change: field(&ids.change),
        change_pct: field(&ids.change_pct),
        high: field(&ids.high),
        low: field(&ids.low),
        open: field(&ids.open),
        prev: field(&ids.prev),
        volume: field(&ids.volume),
        turnover: field(&ids.turnover),
    }
}
