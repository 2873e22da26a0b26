//! Configuration types

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::common::types::FetchMode;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Fetch behaviour (mode, timeout, concurrency)
    #[serde(default)]
    pub fetch: FetchSettings,
    /// Quote page location and request headers
    #[serde(default)]
    pub source: SourceConfig,
    /// Headless browser backend
    #[serde(default)]
    pub browser: BrowserConfig,
    /// Output rendering
    #[serde(default)]
    pub output: OutputSettings,
    /// General application settings
    #[serde(default)]
    pub settings: AppSettings,
}

/// Orchestration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchSettings {
    /// http, browser or auto
    #[serde(default)]
    pub mode: FetchMode,
    /// Per-attempt timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Maximum HTTP fetches in flight (browser fetches are always sequential)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            mode: FetchMode::default(),
            timeout_ms: default_timeout_ms(),
            concurrency: default_concurrency(),
        }
    }
}

impl FetchSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Concurrency clamped to at least one
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.max(1)
    }
}

fn default_timeout_ms() -> u64 {
    15_000
}

fn default_concurrency() -> usize {
    1
}

/// Quote page source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the quote site
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Client identifier sent as User-Agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Accept-Language hint
    #[serde(default = "default_accept_language")]
    pub accept_language: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            accept_language: default_accept_language(),
        }
    }
}

fn default_base_url() -> String {
    "https://stooq.com".to_string()
}

fn default_user_agent() -> String {
    "stooq-quote-fetcher/0.1 (+https://stooq.com/)".to_string()
}

fn default_accept_language() -> String {
    "en-US,en;q=0.9".to_string()
}

/// WebDriver endpoint used by the browser strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// WebDriver server URL (chromedriver, geckodriver, ...)
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
    /// Browser to request from the driver
    #[serde(default = "default_browser_name")]
    pub browser_name: String,
    /// Run without a visible window
    #[serde(default = "default_headless")]
    pub headless: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            browser_name: default_browser_name(),
            headless: default_headless(),
        }
    }
}

fn default_webdriver_url() -> String {
    "http://localhost:9515".to_string()
}

fn default_browser_name() -> String {
    "chrome".to_string()
}

fn default_headless() -> bool {
    true
}

/// Rendering format for the result set
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    #[default]
    Table,
    Both,
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(default)]
    pub format: OutputFormat,
    /// Keep the raw scraped strings in JSON output
    #[serde(default = "default_include_raw")]
    pub include_raw: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            include_raw: default_include_raw(),
        }
    }
}

fn default_include_raw() -> bool {
    true
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}
