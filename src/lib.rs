//! stooq_quote Library
//!
//! Scrapes market quotes from stooq.com quote pages, with a plain HTTP
//! strategy and a headless browser strategy behind a common trait.

pub mod common;
pub mod config;
pub mod orchestrator;
pub mod render;
pub mod stooq;

// Re-export commonly used types
pub use common::errors::{QuoteError, Result};
pub use common::traits::{BrowserBackend, FetchStrategy};
pub use common::types::{
    normalize_symbols, FetchError, FetchMode, FetchReport, Quote, RawFieldSet, ResultEntry,
    Symbol,
};
pub use config::types::AppConfig;
pub use orchestrator::Orchestrator;
pub use stooq::{BrowserStrategy, StooqHttpClient, WebDriverBackend};
