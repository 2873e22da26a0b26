//! Plain HTTP fetch strategy for the stooq quote page

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use super::extract::extract_fields;
use crate::common::errors::{QuoteError, Result};
use crate::common::traits::FetchStrategy;
use crate::common::types::{FetchMode, RawFieldSet, Symbol};
use crate::config::types::SourceConfig;

/// Quote page URL for a symbol: `{base}/q/?s={symbol}`
pub fn quote_url(base_url: &Url, symbol: &Symbol) -> Result<Url> {
    let mut url = base_url.join("/q/")?;
    url.query_pairs_mut().append_pair("s", symbol.as_str());
    Ok(url)
}

/// HTTP client that downloads the quote page and scans it for fields
#[derive(Debug, Clone)]
pub struct StooqHttpClient {
    /// HTTP client
    client: Client,
    /// Base URL of the quote site
    base_url: Url,
}

impl StooqHttpClient {
    /// Create a client with the default source settings
    pub fn new() -> Result<Self> {
        Self::from_config(&SourceConfig::default())
    }

    /// Create a client from source settings
    pub fn from_config(source: &SourceConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml"),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&source.accept_language).map_err(|e| {
                QuoteError::Configuration(format!("invalid Accept-Language: {}", e))
            })?,
        );

        let client = Client::builder()
            .user_agent(source.user_agent.as_str())
            .default_headers(headers)
            .build()
            .map_err(|e| QuoteError::Internal(e.to_string()))?;

        Ok(Self {
            client,
            base_url: Url::parse(source.base_url.trim_end_matches('/'))?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Download the quote page markup.
    ///
    /// Undecodable bytes are replaced rather than failing the fetch.
    #[instrument(skip(self))]
    pub async fn fetch_markup(&self, symbol: &Symbol, timeout: Duration) -> Result<String> {
        let url = quote_url(&self.base_url, symbol)?;
        debug!("Fetching quote page from: {}", url);

        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_transport_error(e, &url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(QuoteError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| map_transport_error(e, &url))?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

/// Timeouts get their own variant so they read clearly in error output
fn map_transport_error(err: reqwest::Error, url: &Url) -> QuoteError {
    if err.is_timeout() {
        QuoteError::Timeout(format!("GET {}", url))
    } else {
        QuoteError::HttpRequest(err)
    }
}

#[async_trait]
impl FetchStrategy for StooqHttpClient {
    fn kind(&self) -> FetchMode {
        FetchMode::Http
    }

    async fn fetch_raw(&self, symbol: &Symbol, timeout: Duration) -> Result<RawFieldSet> {
        let markup = self.fetch_markup(symbol, timeout).await?;
        Ok(extract_fields(&markup, symbol))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = StooqHttpClient::new();
        assert!(client.is_ok());
    }

    #[test]
    fn test_url_normalization() {
        let client = StooqHttpClient::from_config(&SourceConfig {
            base_url: "https://stooq.com/".to_string(),
            ..SourceConfig::default()
        })
        .unwrap();
        assert_eq!(client.base_url().as_str(), "https://stooq.com/");
    }

    #[test]
    fn test_quote_url_encodes_symbol() {
        let base = Url::parse("https://stooq.com").unwrap();

        let url = quote_url(&base, &Symbol::parse("gc.f").unwrap()).unwrap();
        assert_eq!(url.as_str(), "https://stooq.com/q/?s=gc.f");

        let url = quote_url(&base, &Symbol::parse("^spx").unwrap()).unwrap();
        assert_eq!(url.as_str(), "https://stooq.com/q/?s=%5Espx");
    }

    #[test]
    fn test_invalid_base_url_is_configuration_error() {
        let err = StooqHttpClient::from_config(&SourceConfig {
            base_url: "not a url".to_string(),
            ..SourceConfig::default()
        })
        .unwrap_err();
        assert!(err.is_fatal());
    }
}
