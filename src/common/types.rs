//! Core types shared by the extractor, the fetch strategies and the orchestrator

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use super::errors::QuoteError;

/// How quotes are fetched, and which path a failure is attributed to
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// Plain HTTP GET of the quote page
    Http,
    /// Headless browser session. Failures are tagged `playwright`.
    #[serde(rename = "playwright", alias = "browser")]
    #[value(name = "playwright", alias = "browser")]
    Browser,
    /// HTTP first, browser for the symbols that failed
    #[default]
    Auto,
}

impl fmt::Display for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchMode::Http => write!(f, "http"),
            FetchMode::Browser => write!(f, "playwright"),
            FetchMode::Auto => write!(f, "auto"),
        }
    }
}

impl FromStr for FetchMode {
    type Err = QuoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "http" => Ok(FetchMode::Http),
            "browser" | "playwright" => Ok(FetchMode::Browser),
            "auto" => Ok(FetchMode::Auto),
            other => Err(QuoteError::Configuration(format!("invalid mode {}", other))),
        }
    }
}

/// A lower-cased, non-empty instrument identifier such as `gc.f` or `btc.v`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Normalize a raw identifier (trim + lower-case). Empty input is rejected.
    pub fn parse(raw: &str) -> Result<Self, QuoteError> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(QuoteError::Configuration("empty symbol".to_string()));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Symbol {
    type Err = QuoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Symbol::parse(s)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize an input list: blank entries are skipped, duplicates collapse onto their
/// first occurrence. An empty result is a configuration error.
pub fn normalize_symbols<I, S>(raw: I) -> Result<Vec<Symbol>, QuoteError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut symbols = Vec::new();

    for entry in raw {
        let Ok(symbol) = Symbol::parse(entry.as_ref()) else {
            continue;
        };
        if seen.insert(symbol.clone()) {
            symbols.push(symbol);
        }
    }

    if symbols.is_empty() {
        return Err(QuoteError::Configuration(
            "no symbols provided (use --symbols or --symbol)".to_string(),
        ));
    }

    Ok(symbols)
}

/// Raw per-field strings as scraped from the page, before any numeric parsing.
///
/// Produced fresh by every fetch attempt and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFieldSet {
    #[serde(default)]
    pub last: Option<String>,
    /// Identifier the last price was found under (e.g. `aq_gc.f_c2|3`)
    #[serde(default)]
    pub last_id: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub change: Option<String>,
    #[serde(default)]
    pub change_pct: Option<String>,
    #[serde(default)]
    pub high: Option<String>,
    #[serde(default)]
    pub low: Option<String>,
    #[serde(default)]
    pub open: Option<String>,
    #[serde(default)]
    pub prev: Option<String>,
    #[serde(default)]
    pub volume: Option<String>,
    #[serde(default)]
    pub turnover: Option<String>,
}

/// Normalized quote snapshot for one symbol
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub symbol: Symbol,
    pub last: Option<f64>,
    pub date: Option<String>,
    pub time: Option<String>,
    /// `"{date} {time}"`, only when both are present
    pub updated_at: Option<String>,
    pub change: Option<f64>,
    /// Percentage magnitude with decoration stripped, sign preserved
    pub change_pct: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub open: Option<f64>,
    pub prev: Option<f64>,
    pub volume: Option<f64>,
    pub turnover: Option<f64>,
    /// Originating raw fields, kept for diagnostics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<RawFieldSet>,
}

impl Quote {
    /// Drop the diagnostic raw fields
    pub fn without_raw(mut self) -> Self {
        self.raw = None;
        self
    }
}

/// Terminal failure for one symbol
#[derive(Debug, Clone, PartialEq)]
pub struct FetchError {
    pub symbol: Symbol,
    pub message: String,
    /// Path the failure is attributed to
    pub strategy: FetchMode,
}

impl FetchError {
    pub fn new(symbol: Symbol, message: impl Into<String>, strategy: FetchMode) -> Self {
        Self {
            symbol,
            message: message.into(),
            strategy,
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.symbol, self.message, self.strategy)
    }
}

impl Serialize for FetchError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Detail<'a> {
            message: &'a str,
            mode: FetchMode,
        }

        let mut state = serializer.serialize_struct("FetchError", 2)?;
        state.serialize_field("symbol", &self.symbol)?;
        state.serialize_field(
            "error",
            &Detail {
                message: &self.message,
                mode: self.strategy,
            },
        )?;
        state.end()
    }
}

/// Outcome for one symbol
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResultEntry {
    Quote(Quote),
    Failed(FetchError),
}

impl ResultEntry {
    pub fn symbol(&self) -> &Symbol {
        match self {
            ResultEntry::Quote(q) => &q.symbol,
            ResultEntry::Failed(e) => &e.symbol,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ResultEntry::Failed(_))
    }

    pub fn as_quote(&self) -> Option<&Quote> {
        match self {
            ResultEntry::Quote(q) => Some(q),
            ResultEntry::Failed(_) => None,
        }
    }

    pub fn as_error(&self) -> Option<&FetchError> {
        match self {
            ResultEntry::Quote(_) => None,
            ResultEntry::Failed(e) => Some(e),
        }
    }
}

/// Results of one orchestration run, in caller input order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FetchReport {
    entries: Vec<ResultEntry>,
}

impl FetchReport {
    pub fn new(entries: Vec<ResultEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[ResultEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<ResultEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn failures(&self) -> impl Iterator<Item = &FetchError> {
        self.entries.iter().filter_map(ResultEntry::as_error)
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    pub fn has_failures(&self) -> bool {
        self.entries.iter().any(ResultEntry::is_failure)
    }

    /// Strip `raw` from every successful quote
    pub fn without_raw(self) -> Self {
        let entries = self
            .entries
            .into_iter()
            .map(|entry| match entry {
                ResultEntry::Quote(q) => ResultEntry::Quote(q.without_raw()),
                failed => failed,
            })
            .collect();
        Self { entries }
    }
}
