//! Headless browser fetch strategy
//!
//! Used when the plain HTTP page does not carry the values (they are filled in by
//! page scripts for some instruments). The page is rendered by a
//! [`BrowserBackend`] and the same identifier table as the text extractor is
//! resolved against the live DOM.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use super::extract::{last_price_candidates, FieldIds};
use super::http::quote_url;
use crate::common::errors::{QuoteError, Result};
use crate::common::traits::{BrowserBackend, FetchStrategy};
use crate::common::types::{FetchMode, RawFieldSet, Symbol};

/// In-page extraction routine.
///
/// `arguments[0]` is the ordered list of last-price ids to probe, `arguments[1]`
/// maps field names to element ids. The first probe id present in the DOM wins.
pub const EXTRACT_FIELDS_SCRIPT: &str = r#"
const lastCandidates = arguments[0];
const ids = arguments[1];
const text = (el) => (el.textContent || "").trim();
const out = { last: null, last_id: null };
for (const id of lastCandidates) {
  const el = document.getElementById(id);
  if (el) {
    out.last_id = id;
    out.last = text(el);
    break;
  }
}
for (const [key, id] of Object.entries(ids)) {
  const el = document.getElementById(id);
  out[key] = el ? text(el) : null;
}
return out;
"#;

/// Script arguments for one symbol
pub fn script_args(symbol: &Symbol) -> Vec<Value> {
    let ids = FieldIds::for_symbol(symbol);
    vec![
        json!(last_price_candidates(symbol)),
        json!({
            "date": ids.date,
            "time": ids.time,
            "change": ids.change,
            "change_pct": ids.change_pct,
            "high": ids.high,
            "low": ids.low,
            "open": ids.open,
            "prev": ids.prev,
            "volume": ids.volume,
            "turnover": ids.turnover,
        }),
    ]
}

/// Fetch strategy that renders the quote page in a headless browser
#[derive(Clone)]
pub struct BrowserStrategy {
    backend: Arc<dyn BrowserBackend>,
    base_url: Url,
}

impl BrowserStrategy {
    pub fn new(backend: Arc<dyn BrowserBackend>, base_url: &str) -> Result<Self> {
        Ok(Self {
            backend,
            base_url: Url::parse(base_url.trim_end_matches('/'))?,
        })
    }
}

#[async_trait]
impl FetchStrategy for BrowserStrategy {
    fn kind(&self) -> FetchMode {
        FetchMode::Browser
    }

    #[instrument(skip(self))]
    async fn fetch_raw(&self, symbol: &Symbol, timeout: Duration) -> Result<RawFieldSet> {
        let url = quote_url(&self.base_url, symbol)?;
        debug!("Rendering {} with {}", url, self.backend.name());

        let value = self
            .backend
            .evaluate_page(&url, EXTRACT_FIELDS_SCRIPT, &script_args(symbol), timeout)
            .await?;

        if !value.is_object() {
            return Err(QuoteError::Browser(format!(
                "extraction script returned {} instead of a field map",
                value
            )));
        }

        Ok(serde_json::from_value(value)?)
    }
}
