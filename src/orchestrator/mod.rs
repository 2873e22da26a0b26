//! Fetch orchestration
//!
//! Drives the two fetch strategies for a batch of symbols.
//!
//! # Modes
//!
//! ```text
//! http     symbols ──► HTTP (≤ concurrency in flight) ──► reorder
//! browser  symbols ──► browser, one at a time ─────────► reorder
//! auto     symbols ──► HTTP (≤ concurrency in flight)
//!                        │ failed subset, input order
//!                        ▼
//!                      browser, one at a time ─────────► reorder
//! ```
//!
//! Every symbol gets exactly one [`ResultEntry`], and the report is always in
//! the caller's order no matter how the fetches completed. A failure for one
//! symbol never affects another.

mod collect;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::common::errors::{QuoteError, Result};
use crate::common::traits::FetchStrategy;
use crate::common::types::{FetchMode, FetchReport, ResultEntry, Symbol};
use crate::config::types::{AppConfig, FetchSettings};
use crate::stooq::{BrowserStrategy, StooqHttpClient, WebDriverBackend};

use collect::{fetch_concurrently, fetch_sequentially, reorder};

/// Runs a batch of symbols through the cheap and/or expensive strategy
#[derive(Clone)]
pub struct Orchestrator {
    /// Cheap strategy, run concurrently
    http: Arc<dyn FetchStrategy>,
    /// Expensive strategy, always sequential
    browser: Arc<dyn FetchStrategy>,
    /// Per-attempt timeout
    timeout: Duration,
    /// HTTP fetches in flight
    concurrency: usize,
}

impl Orchestrator {
    pub fn new(
        http: Arc<dyn FetchStrategy>,
        browser: Arc<dyn FetchStrategy>,
        settings: &FetchSettings,
    ) -> Self {
        Self {
            http,
            browser,
            timeout: settings.timeout(),
            concurrency: settings.effective_concurrency(),
        }
    }

    /// Wire the stooq HTTP client and the WebDriver-backed browser strategy
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let http = StooqHttpClient::from_config(&config.source)?;
        let backend = WebDriverBackend::from_config(&config.browser)?;
        let browser = BrowserStrategy::new(Arc::new(backend), &config.source.base_url)?;

        Ok(Self::new(Arc::new(http), Arc::new(browser), &config.fetch))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Fetch every symbol using `mode`.
    ///
    /// Duplicate symbols are collapsed onto their first occurrence. An empty list is
    /// a configuration error and nothing is fetched.
    #[instrument(skip(self, symbols), fields(count = symbols.len()))]
    pub async fn run(&self, symbols: &[Symbol], mode: FetchMode) -> Result<FetchReport> {
        let symbols = dedupe(symbols);
        if symbols.is_empty() {
            return Err(QuoteError::Configuration(
                "no symbols provided (use --symbols or --symbol)".to_string(),
            ));
        }

        info!(
            "Fetching {} symbol(s) in {} mode (concurrency {}, timeout {:?})",
            symbols.len(),
            mode,
            self.concurrency,
            self.timeout
        );

        let entries = match mode {
            FetchMode::Http => {
                let outcomes = fetch_concurrently(
                    self.http.as_ref(),
                    &symbols,
                    self.timeout,
                    self.concurrency,
                )
                .await;
                reorder(&symbols, outcomes, FetchMode::Http)
            }
            FetchMode::Browser => {
                let outcomes =
                    fetch_sequentially(self.browser.as_ref(), &symbols, self.timeout).await;
                reorder(&symbols, outcomes, FetchMode::Browser)
            }
            FetchMode::Auto => self.run_with_escalation(&symbols).await,
        };

        let report = FetchReport::new(entries);
        info!(
            "Fetched {} quote(s), {} failure(s)",
            report.len() - report.failure_count(),
            report.failure_count()
        );
        Ok(report)
    }

    /// HTTP for everything, then the browser for whatever HTTP could not complete
    async fn run_with_escalation(&self, symbols: &[Symbol]) -> Vec<ResultEntry> {
        let mut outcomes = fetch_concurrently(
            self.http.as_ref(),
            symbols,
            self.timeout,
            self.concurrency,
        )
        .await;

        let fallback: Vec<Symbol> = symbols
            .iter()
            .filter(|s| !matches!(outcomes.get(*s), Some(Ok(_))))
            .cloned()
            .collect();

        for symbol in &fallback {
            if let Some(Err(e)) = outcomes.get(symbol) {
                warn!(symbol = %symbol, "HTTP fetch failed, retrying in browser: {}", e);
            }
        }
        outcomes.retain(|_, outcome| outcome.is_ok());

        if !fallback.is_empty() {
            let retried = fetch_sequentially(self.browser.as_ref(), &fallback, self.timeout).await;
            outcomes.extend(retried);
        }

        reorder(symbols, outcomes, FetchMode::Auto)
    }
}

/// Keep the first occurrence of each symbol
fn dedupe(symbols: &[Symbol]) -> Vec<Symbol> {
    let mut seen = HashSet::new();
    symbols
        .iter()
        .filter(|s| seen.insert(*s))
        .cloned()
        .collect()
}
