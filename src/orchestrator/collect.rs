//! Bounded fan-out and order restoration

use futures_util::{stream, StreamExt};
use std::collections::HashMap;
use std::time::Duration;

use crate::common::errors::Result;
use crate::common::traits::FetchStrategy;
use crate::common::types::{FetchError, FetchMode, Quote, ResultEntry, Symbol};

/// Per-symbol outcomes, keyed by symbol. Each symbol is written once.
pub(crate) type Outcomes = HashMap<Symbol, Result<Quote>>;

/// Run `strategy` for every symbol with at most `concurrency` attempts in flight.
/// Completion order is arbitrary.
pub(crate) async fn fetch_concurrently(
    strategy: &dyn FetchStrategy,
    symbols: &[Symbol],
    timeout: Duration,
    concurrency: usize,
) -> Outcomes {
    stream::iter(symbols.iter().cloned())
        .map(|symbol| async move {
            let outcome = strategy.fetch_quote(&symbol, timeout).await;
            (symbol, outcome)
        })
        .buffer_unordered(concurrency.max(1))
        .collect::<Outcomes>()
        .await
}

/// Run `strategy` for every symbol, one at a time, in order.
pub(crate) async fn fetch_sequentially(
    strategy: &dyn FetchStrategy,
    symbols: &[Symbol],
    timeout: Duration,
) -> Outcomes {
    let mut outcomes = Outcomes::with_capacity(symbols.len());
    for symbol in symbols {
        let outcome = strategy.fetch_quote(symbol, timeout).await;
        outcomes.insert(symbol.clone(), outcome);
    }
    outcomes
}

/// Emit one entry per symbol in `symbols` order, tagging failures with `mode`.
pub(crate) fn reorder(
    symbols: &[Symbol],
    mut outcomes: Outcomes,
    mode: FetchMode,
) -> Vec<ResultEntry> {
    symbols
        .iter()
        .map(|symbol| match outcomes.remove(symbol) {
            Some(Ok(quote)) => ResultEntry::Quote(quote),
            Some(Err(e)) => {
                ResultEntry::Failed(FetchError::new(symbol.clone(), e.to_string(), mode))
            }
            None => ResultEntry::Failed(FetchError::new(
                symbol.clone(),
                format!("{} fetch produced no result", mode),
                mode,
            )),
        })
        .collect()
}
