//! Error types for the application

use thiserror::Error;

use super::types::FetchMode;

/// Result type alias using our QuoteError
pub type Result<T> = std::result::Result<T, QuoteError>;

/// Main error type for quote fetching
#[derive(Error, Debug)]
pub enum QuoteError {
    /// Invalid or missing configuration (no symbols, bad mode/format, ...)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// HTTP request errors
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// Upstream answered with a non-2xx status
    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// Timeout errors
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Browser launch, navigation or evaluation failure
    #[error("Browser error: {0}")]
    Browser(String),

    /// The browser automation endpoint could not be reached at all
    #[error("Browser backend unavailable: {0}")]
    BrowserUnavailable(String),

    /// A quote was assembled but is missing required fields
    #[error("parsed quote missing required fields ({0})")]
    IncompleteQuote(FetchMode),

    /// JSON serialization/deserialization errors
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Invalid upstream response
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl QuoteError {
    /// Whether the error is fatal to the whole run rather than to one symbol
    pub fn is_fatal(&self) -> bool {
        matches!(self, QuoteError::Configuration(_))
    }
}

impl From<url::ParseError> for QuoteError {
    fn from(err: url::ParseError) -> Self {
        QuoteError::Configuration(format!("invalid URL: {}", err))
    }
}
