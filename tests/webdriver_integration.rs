//! Integration tests for the WebDriver browser backend
//!
//! A wiremock server plays the WebDriver endpoint. Every test that opens a
//! session asserts it is deleted exactly once.

mod common;

use common::sym;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use stooq_quote::{BrowserBackend, BrowserStrategy, FetchStrategy, QuoteError, WebDriverBackend};
use url::Url;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SESSION_ID: &str = "abc";

async fn mount_session(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/session"))
        .and(body_partial_json(json!({
            "capabilities": { "alwaysMatch": { "browserName": "chrome", "pageLoadStrategy": "eager" } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": { "sessionId": SESSION_ID, "capabilities": {} }
        })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("DELETE"))
        .and(path(format!("/session/{}", SESSION_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": null })))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_navigate(server: &MockServer, target: &str) {
    Mock::given(method("POST"))
        .and(path(format!("/session/{}/url", SESSION_ID)))
        .and(body_partial_json(json!({ "url": target })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": null })))
        .expect(1)
        .mount(server)
        .await;
}

fn field_map() -> serde_json::Value {
    json!({
        "last": "64,210.5",
        "last_id": "aq_btc.v_c0|3",
        "date": "2024-05-10",
        "time": "21:14:09",
        "change": "-310.2",
        "change_pct": "(-0.48%)",
        "high": "64,900",
        "low": "63,800",
        "open": "64,500",
        "prev": "64,520.7",
        "volume": "12.3k",
        "turnover": null
    })
}

#[test_log::test(tokio::test)]
async fn test_browser_strategy_over_webdriver() {
    let server = MockServer::start().await;
    mount_session(&server).await;
    mount_navigate(&server, "https://stooq.com/q/?s=btc.v").await;
    Mock::given(method("POST"))
        .and(path(format!("/session/{}/execute/sync", SESSION_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": field_map() })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = WebDriverBackend::new(&server.uri()).unwrap();
    let strategy = BrowserStrategy::new(Arc::new(backend), "https://stooq.com").unwrap();

    let quote = strategy
        .fetch_quote(&sym("btc.v"), Duration::from_secs(5))
        .await
        .expect("browser quote should be complete");

    assert_eq!(quote.last, Some(64210.5));
    assert_eq!(quote.change_pct, Some(-0.48));
    assert_eq!(quote.volume, Some(12300.0));
    assert_eq!(quote.updated_at.as_deref(), Some("2024-05-10 21:14:09"));
    assert_eq!(
        quote.raw.unwrap().last_id.as_deref(),
        Some("aq_btc.v_c0|3")
    );
}

#[tokio::test]
async fn test_script_error_still_deletes_session() {
    let server = MockServer::start().await;
    mount_session(&server).await;
    mount_navigate(&server, "https://stooq.com/q/?s=gc.f").await;
    Mock::given(method("POST"))
        .and(path(format!("/session/{}/execute/sync", SESSION_ID)))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "value": { "error": "javascript error", "message": "boom", "stacktrace": "" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = WebDriverBackend::new(&server.uri()).unwrap();
    let target = Url::parse("https://stooq.com/q/?s=gc.f").unwrap();
    let err = backend
        .evaluate_page(&target, "return 1;", &[], Duration::from_secs(5))
        .await
        .unwrap_err();

    match err {
        QuoteError::Browser(message) => {
            assert_eq!(message, "javascript error (HTTP 500): boom");
        }
        other => panic!("expected Browser error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_slow_page_times_out_and_deletes_session() {
    let server = MockServer::start().await;
    mount_session(&server).await;
    Mock::given(method("POST"))
        .and(path(format!("/session/{}/url", SESSION_ID)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "value": null }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let backend = WebDriverBackend::new(&server.uri()).unwrap();
    let target = Url::parse("https://stooq.com/q/?s=gc.f").unwrap();
    let err = backend
        .evaluate_page(&target, "return 1;", &[], Duration::from_millis(200))
        .await
        .unwrap_err();

    assert!(matches!(err, QuoteError::Timeout(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_deadline_covers_session_start() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "value": { "sessionId": SESSION_ID, "capabilities": {} } }))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/session/{}/url", SESSION_ID)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "value": null }))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/session/{}/execute/sync", SESSION_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": field_map() })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("/session/{}", SESSION_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": null })))
        .expect(1)
        .mount(&server)
        .await;

    // each step fits the timeout on its own, both together do not
    let backend = WebDriverBackend::new(&server.uri()).unwrap();
    let target = Url::parse("https://stooq.com/q/?s=gc.f").unwrap();
    let err = backend
        .evaluate_page(&target, "return 1;", &[], Duration::from_millis(300))
        .await
        .unwrap_err();

    assert!(matches!(err, QuoteError::Timeout(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_missing_session_id_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": {} })))
        .mount(&server)
        .await;

    let backend = WebDriverBackend::new(&server.uri()).unwrap();
    let target = Url::parse("https://stooq.com/q/?s=gc.f").unwrap();
    let err = backend
        .evaluate_page(&target, "return 1;", &[], Duration::from_secs(1))
        .await
        .unwrap_err();

    assert!(matches!(err, QuoteError::InvalidResponse(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_unreachable_driver_is_unavailable() {
    // nothing listens on port 1
    let backend = WebDriverBackend::new("http://127.0.0.1:1").unwrap();
    let target = Url::parse("https://stooq.com/q/?s=gc.f").unwrap();
    let err = backend
        .evaluate_page(&target, "return 1;", &[], Duration::from_secs(2))
        .await
        .unwrap_err();

    assert!(
        matches!(err, QuoteError::BrowserUnavailable(_)),
        "got {:?}",
        err
    );
}
