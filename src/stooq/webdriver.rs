//! Minimal W3C WebDriver client used as the headless browser backend
//!
//! Only the handful of commands the browser strategy needs are implemented:
//! new session, navigate, execute script, delete session. Any WebDriver server
//! (chromedriver, geckodriver, a Selenium grid) can sit behind `webdriver_url`.

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::common::errors::{QuoteError, Result};
use crate::common::traits::BrowserBackend;
use crate::config::types::BrowserConfig;

/// WebDriver-backed browser automation
#[derive(Debug, Clone)]
pub struct WebDriverBackend {
    /// HTTP client for the driver protocol
    client: Client,
    /// Driver endpoint, always ending with `/`
    endpoint: Url,
    /// Requested browser (chrome, firefox, ...)
    browser_name: String,
    /// Whether to launch without a window
    headless: bool,
}

impl WebDriverBackend {
    /// Create a backend for a driver listening at `webdriver_url`
    pub fn new(webdriver_url: &str) -> Result<Self> {
        Self::from_config(&BrowserConfig {
            webdriver_url: webdriver_url.to_string(),
            ..BrowserConfig::default()
        })
    }

    pub fn from_config(config: &BrowserConfig) -> Result<Self> {
        let mut endpoint = Url::parse(&config.webdriver_url)?;
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }

        let client = Client::builder()
            .build()
            .map_err(|e| QuoteError::Internal(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            browser_name: config.browser_name.to_lowercase(),
            headless: config.headless,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Capabilities for a new session.
    ///
    /// `pageLoadStrategy: eager` makes navigation return once the DOM is parsed
    /// instead of waiting for every resource.
    fn capabilities(&self, timeout: Duration) -> Value {
        let millis = timeout.as_millis() as u64;
        let mut always_match = json!({
            "browserName": self.browser_name,
            "pageLoadStrategy": "eager",
            "timeouts": { "pageLoad": millis, "script": millis },
        });

        if self.headless {
            let (key, args) = match self.browser_name.as_str() {
                "firefox" => ("moz:firefoxOptions", json!(["-headless"])),
                "msedge" | "microsoftedge" => (
                    "ms:edgeOptions",
                    json!(["--headless=new", "--disable-gpu"]),
                ),
                _ => (
                    "goog:chromeOptions",
                    json!(["--headless=new", "--disable-gpu", "--no-sandbox"]),
                ),
            };
            always_match[key] = json!({ "args": args });
        }

        json!({ "capabilities": { "alwaysMatch": always_match } })
    }

    /// Start a browser session. The returned guard must be closed with
    /// [`Session::close`]; if it is dropped instead, deletion happens in the
    /// background.
    #[instrument(skip(self))]
    async fn open_session(&self, timeout: Duration) -> Result<Session> {
        let url = self.endpoint.join("session")?;
        let value = send_command(
            &self.client,
            Method::POST,
            url,
            Some(self.capabilities(timeout)),
            timeout,
        )
        .await?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                QuoteError::InvalidResponse("new session response has no sessionId".to_string())
            })?;
        let session_url = self.endpoint.join(&format!("session/{}/", session_id))?;
        debug!(session = %session_id, "WebDriver session opened");

        Ok(Session {
            client: self.client.clone(),
            url: session_url,
            released: false,
        })
    }
}

/// An open WebDriver session. Closing it ends the browser process.
struct Session {
    client: Client,
    /// `{endpoint}/session/{id}/`
    url: Url,
    released: bool,
}

impl Session {
    async fn navigate(&self, target: &Url, timeout: Duration) -> Result<()> {
        let url = self.url.join("url")?;
        send_command(
            &self.client,
            Method::POST,
            url,
            Some(json!({ "url": target.as_str() })),
            timeout,
        )
        .await?;
        Ok(())
    }

    async fn execute(&self, script: &str, args: &[Value], timeout: Duration) -> Result<Value> {
        let url = self.url.join("execute/sync")?;
        send_command(
            &self.client,
            Method::POST,
            url,
            Some(json!({ "script": script, "args": args })),
            timeout,
        )
        .await
    }

    /// Delete the session. Failures are logged, never surfaced.
    async fn close(mut self) {
        self.released = true;
        let delete_url = session_root(&self.url);
        match send_command(
            &self.client,
            Method::DELETE,
            delete_url,
            None,
            Duration::from_secs(10),
        )
        .await
        {
            Ok(_) => debug!(session = %self.url, "WebDriver session closed"),
            Err(e) => warn!(session = %self.url, "Failed to close WebDriver session: {}", e),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        // Dropped mid-flight (e.g. the caller's future was cancelled)
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(session = %self.url, "WebDriver session leaked: no runtime to close it");
            return;
        };
        let client = self.client.clone();
        let url = session_root(&self.url);
        handle.spawn(async move {
            if let Err(e) = client.delete(url).send().await {
                warn!("Failed to close abandoned WebDriver session: {}", e);
            }
        });
    }
}

/// `{endpoint}/session/{id}/` -> `{endpoint}/session/{id}`
fn session_root(session_url: &Url) -> Url {
    let mut url = session_url.clone();
    let path = session_url.path().trim_end_matches('/').to_string();
    url.set_path(&path);
    url
}

/// Send one WebDriver command and unwrap the `value` member of the reply
async fn send_command(
    client: &Client,
    method: Method,
    url: Url,
    body: Option<Value>,
    timeout: Duration,
) -> Result<Value> {
    let mut request = client.request(method, url.clone()).timeout(timeout);
    if let Some(body) = body {
        request = request.json(&body);
    }

    let response = request.send().await.map_err(|e| {
        if e.is_connect() {
            QuoteError::BrowserUnavailable(format!("cannot reach WebDriver at {}: {}", url, e))
        } else if e.is_timeout() {
            QuoteError::Timeout(format!("WebDriver command {}", url))
        } else {
            QuoteError::Browser(e.to_string())
        }
    })?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| QuoteError::Browser(e.to_string()))?;
    let mut reply: Value = if text.trim().is_empty() {
        Value::Null
    } else {
        match serde_json::from_str(&text) {
            Ok(reply) => reply,
            Err(_) if !status.is_success() => {
                return Err(QuoteError::Browser(format!(
                    "WebDriver returned HTTP {}",
                    status.as_u16()
                )));
            }
            Err(e) => return Err(e.into()),
        }
    };
    let value = reply.get_mut("value").map(Value::take).unwrap_or(Value::Null);

    if !status.is_success() {
        let error = value
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        let message = value.get("message").and_then(Value::as_str).unwrap_or("");
        return Err(QuoteError::Browser(format!(
            "{} (HTTP {}): {}",
            error,
            status.as_u16(),
            message
        )));
    }

    Ok(value)
}

#[async_trait]
impl BrowserBackend for WebDriverBackend {
    #[instrument(skip(self, script, args))]
    async fn evaluate_page(
        &self,
        url: &Url,
        script: &str,
        args: &[Value],
        timeout: Duration,
    ) -> Result<Value> {
        // one deadline covers session start, navigation and evaluation
        let deadline = Instant::now() + timeout;
        let expired = || {
            QuoteError::Timeout(format!(
                "browser fetch of {} exceeded {} ms",
                url,
                timeout.as_millis()
            ))
        };

        let session = match timeout_at(deadline, self.open_session(timeout)).await {
            Ok(session) => session?,
            Err(_) => return Err(expired()),
        };

        let outcome = timeout_at(deadline, async {
            session.navigate(url, timeout).await?;
            session.execute(script, args, timeout).await
        })
        .await;

        session.close().await;

        outcome.unwrap_or_else(|_| Err(expired()))
    }

    fn name(&self) -> &'static str {
        "webdriver"
    }
}
