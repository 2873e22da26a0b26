//! Common test utilities and fixtures

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use stooq_quote::{FetchMode, FetchStrategy, QuoteError, RawFieldSet, Result, Symbol};

/// Quote page with every field populated, ids unquoted like the live site
pub fn complete_page(symbol: &str) -> String {
    format!(
        r#"<html><body>
<table>
<tr><td>Last</td><td><b><span id=aq_{s}_c2|3>2,650.50</span></b></td></tr>
<tr><td>Date</td><td><span id="aq_{s}_d2">2024-05-10</span> <span id='aq_{s}_t1'>17:00:03</span></td></tr>
<tr><td>Change</td><td><span id=aq_{s}_m2>+12.40</span> (<span id=aq_{s}_m3>+0.47%</span>)</td></tr>
<tr><td>High</td><td><span id=aq_{s}_h>2701.3</span></td></tr>
<tr><td>Low</td><td><span id=aq_{s}_l>2640</span></td></tr>
<tr><td>Open</td><td><span id=aq_{s}_o>2690</span></td></tr>
<tr><td>Prev</td><td><span id=aq_{s}_p>2638.1</span></td></tr>
<tr><td>Volume</td><td><span id=aq_{s}_v2>1.5m</span></td></tr>
</table>
</body></html>"#,
        s = symbol
    )
}

/// Quote page whose fields first appear as loading placeholders
pub fn placeholder_page(symbol: &str) -> String {
    format!(
        r#"<div class="loading"><span id=aq_{s}_c0|3></span><span id=aq_{s}_h>-</span></div>
{page}"#,
        s = symbol,
        page = complete_page(symbol)
    )
}

/// Quote page with a last price but no date/time or range fields
pub fn incomplete_page(symbol: &str) -> String {
    format!(
        r#"<html><body><span id=aq_{s}_c2|3>101.5</span><span id=aq_{s}_m2>0.5</span></body></html>"#,
        s = symbol
    )
}

/// Raw field set that passes validation
pub fn complete_raw(last: &str) -> RawFieldSet {
    RawFieldSet {
        last: Some(last.to_string()),
        last_id: Some("aq_test_c2|3".to_string()),
        date: Some("2024-05-10".to_string()),
        time: Some("17:00:03".to_string()),
        change: Some("1".to_string()),
        change_pct: Some("0.5%".to_string()),
        high: Some("2".to_string()),
        low: Some("0.5".to_string()),
        open: Some("1".to_string()),
        prev: Some("1".to_string()),
        volume: None,
        turnover: None,
    }
}

pub fn sym(s: &str) -> Symbol {
    Symbol::parse(s).unwrap()
}

/// Scripted outcome for one symbol
#[derive(Clone)]
pub enum Scripted {
    Quote { last: String, delay: Duration },
    Incomplete,
    Fail(String),
}

/// In-memory strategy with scripted per-symbol outcomes.
///
/// Records the order calls start and finish in, plus the peak number of calls
/// in flight.
pub struct FakeStrategy {
    kind: FetchMode,
    script: HashMap<String, Scripted>,
    calls: Mutex<Vec<String>>,
    completed: Mutex<Vec<String>>,
    in_flight: Mutex<(usize, usize)>,
}

impl FakeStrategy {
    pub fn new(kind: FetchMode) -> Self {
        Self {
            kind,
            script: HashMap::new(),
            calls: Mutex::new(Vec::new()),
            completed: Mutex::new(Vec::new()),
            in_flight: Mutex::new((0, 0)),
        }
    }

    pub fn quote(mut self, symbol: &str, last: &str, delay_ms: u64) -> Self {
        self.script.insert(
            symbol.to_string(),
            Scripted::Quote {
                last: last.to_string(),
                delay: Duration::from_millis(delay_ms),
            },
        );
        self
    }

    pub fn incomplete(mut self, symbol: &str) -> Self {
        self.script.insert(symbol.to_string(), Scripted::Incomplete);
        self
    }

    pub fn fail(mut self, symbol: &str, message: &str) -> Self {
        self.script
            .insert(symbol.to_string(), Scripted::Fail(message.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn completed(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.in_flight.lock().unwrap().1
    }
}

#[async_trait]
impl FetchStrategy for FakeStrategy {
    fn kind(&self) -> FetchMode {
        self.kind
    }

    async fn fetch_raw(&self, symbol: &Symbol, _timeout: Duration) -> Result<RawFieldSet> {
        self.calls.lock().unwrap().push(symbol.to_string());
        {
            let mut in_flight = self.in_flight.lock().unwrap();
            in_flight.0 += 1;
            in_flight.1 = in_flight.1.max(in_flight.0);
        }

        let outcome = match self.script.get(symbol.as_str()).cloned() {
            Some(Scripted::Quote { last, delay }) => {
                tokio::time::sleep(delay).await;
                Ok(complete_raw(&last))
            }
            Some(Scripted::Incomplete) => Ok(RawFieldSet {
                last: Some("1".to_string()),
                ..RawFieldSet::default()
            }),
            Some(Scripted::Fail(message)) => Err(QuoteError::InvalidResponse(message)),
            None => Err(QuoteError::InvalidResponse(format!("unscripted {}", symbol))),
        };

        self.in_flight.lock().unwrap().0 -= 1;
        self.completed.lock().unwrap().push(symbol.to_string());
        outcome
    }
}
