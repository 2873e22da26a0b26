//! Quote assembly and completeness validation

use super::parse::{parse_number_loose, parse_percent_loose};
use crate::common::types::{Quote, RawFieldSet, Symbol};

/// Blank strings count as missing
fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

/// Build a normalized quote from raw field strings. Pure; never fails.
pub fn assemble(symbol: &Symbol, raw: RawFieldSet) -> Quote {
    let num = |v: &Option<String>| parse_number_loose(v.as_deref());
    let date = non_empty(&raw.date);
    let time = non_empty(&raw.time);
    let updated_at = match (&date, &time) {
        (Some(d), Some(t)) => Some(format!("{} {}", d, t)),
        _ => None,
    };

    Quote {
        symbol: symbol.clone(),
        last: num(&raw.last),
        date,
        time,
        updated_at,
        change: num(&raw.change),
        change_pct: parse_percent_loose(raw.change_pct.as_deref()),
        high: num(&raw.high),
        low: num(&raw.low),
        open: num(&raw.open),
        prev: num(&raw.prev),
        volume: num(&raw.volume),
        turnover: num(&raw.turnover),
        raw: Some(raw),
    }
}

/// A quote is complete when every required field is present.
///
/// `volume` and `turnover` are not required: several instrument kinds never
/// publish them.
pub fn validate(quote: &Quote) -> bool {
    quote.last.is_some()
        && quote.date.is_some()
        && quote.time.is_some()
        && quote.change.is_some()
        && quote.change_pct.is_some()
        && quote.high.is_some()
        && quote.low.is_some()
        && quote.open.is_some()
        && quote.prev.is_some()
}
