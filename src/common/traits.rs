//! Trait definitions for fetch strategies and their collaborators

use async_trait::async_trait;
use std::time::Duration;
use url::Url;

use super::errors::{QuoteError, Result};
use super::types::{FetchMode, Quote, RawFieldSet, Symbol};
use crate::stooq::assemble::{assemble, validate};

/// A way of obtaining the raw quote fields for one symbol.
///
/// The orchestrator only ever talks to this trait, so the cheap HTTP path and the
/// expensive browser path are interchangeable from its point of view.
#[async_trait]
pub trait FetchStrategy: Send + Sync {
    /// Which path this strategy represents (used to tag failures)
    fn kind(&self) -> FetchMode;

    /// Fetch the raw, unparsed fields for a symbol
    ///
    /// # Arguments
    /// * `symbol` - Lower-cased instrument identifier
    /// * `timeout` - Upper bound for this single attempt
    async fn fetch_raw(&self, symbol: &Symbol, timeout: Duration) -> Result<RawFieldSet>;

    /// Fetch, assemble and validate a quote.
    ///
    /// An assembled quote that fails validation is reported as
    /// [`QuoteError::IncompleteQuote`], never as a success.
    async fn fetch_quote(&self, symbol: &Symbol, timeout: Duration) -> Result<Quote> {
        let raw = self.fetch_raw(symbol, timeout).await?;
        let quote = assemble(symbol, raw);
        if !validate(&quote) {
            return Err(QuoteError::IncompleteQuote(self.kind()));
        }
        Ok(quote)
    }
}

/// Browser automation collaborator.
///
/// Implementations open a headless page for `url`, wait until the DOM is parsed,
/// evaluate `script` with `args`, and release the page and browser before returning,
/// whatever the outcome.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BrowserBackend: Send + Sync {
    async fn evaluate_page(
        &self,
        url: &Url,
        script: &str,
        args: &[serde_json::Value],
        timeout: Duration,
    ) -> Result<serde_json::Value>;

    /// Short name for logs
    fn name(&self) -> &'static str;
}
