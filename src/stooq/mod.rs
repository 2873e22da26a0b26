//! stooq.com quote page - extraction and the two fetch strategies

pub mod assemble;
pub mod browser;
pub mod extract;
pub mod http;
pub mod parse;
pub mod webdriver;

pub use browser::BrowserStrategy;
pub use http::StooqHttpClient;
pub use webdriver::WebDriverBackend;
