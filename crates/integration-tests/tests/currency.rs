//! Active currency resolution and selection through the HTTP surface.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use harbor_integration_tests::{TEST_HOST, TestApp, get, post_form};

const CURRENCY_COOKIE: &str = "harbor_currency";

async fn active_currency(app: &TestApp, cookie: Option<&str>, language: Option<&str>) -> String {
    let resp = app.send(get("/api/currency", cookie, language)).await;
    assert_eq!(resp.status, StatusCode::OK);
    resp.json()["active"].as_str().unwrap().to_string()
}

// ============================================================================
// Resolution
// ============================================================================

#[tokio::test]
async fn test_first_visit_uses_shop_default_and_saves_it() {
    let app = TestApp::new();
    let resp = app.send(get("/api/currency", None, None)).await;

    let body = resp.json();
    assert_eq!(body["active"], "USD");
    assert_eq!(body["base"], "USD");
    assert_eq!(body["supported"], serde_json::json!(["USD", "EUR", "PLN"]));

    let cookie = resp.set_cookies(CURRENCY_COOKIE);
    assert_eq!(cookie.len(), 1);
    assert!(cookie[0].starts_with("harbor_currency=USD"));
}

#[tokio::test]
async fn test_saved_cookie_wins_over_locale() {
    let app = TestApp::new();
    let resp = app
        .send(get(
            "/api/currency",
            Some("harbor_currency=EUR"),
            Some("pl-PL,pl;q=0.9"),
        ))
        .await;

    assert_eq!(resp.json()["active"], "EUR");
    assert!(resp.set_cookies(CURRENCY_COOKIE).is_empty());
}

#[tokio::test]
async fn test_locale_maps_to_supported_currency() {
    let app = TestApp::new();
    let resp = app
        .send(get("/api/currency", None, Some("pl-PL,en;q=0.5")))
        .await;

    assert_eq!(resp.json()["active"], "PLN");
    assert!(resp.set_cookies(CURRENCY_COOKIE)[0].starts_with("harbor_currency=PLN"));
}

#[tokio::test]
async fn test_unsupported_saved_value_falls_through_to_locale() {
    let app = TestApp::new();
    let resp = app
        .send(get("/api/currency", Some("harbor_currency=JPY"), Some("de-DE")))
        .await;

    assert_eq!(resp.json()["active"], "EUR");
    assert!(resp.set_cookies(CURRENCY_COOKIE)[0].starts_with("harbor_currency=EUR"));
}

#[tokio::test]
async fn test_unsupported_locale_currency_uses_base() {
    let app = TestApp::new();
    assert_eq!(active_currency(&app, None, Some("ja-JP")).await, "USD");
}

// ============================================================================
// Selection
// ============================================================================

#[tokio::test]
async fn test_unsupported_selection_is_rejected_without_touching_cookie() {
    let app = TestApp::new();
    let resp = app
        .send(post_form(
            "/currency",
            "currency=XXX",
            Some("harbor_currency=EUR"),
        ))
        .await;

    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(resp.set_cookies(CURRENCY_COOKIE).is_empty());
    assert_eq!(
        active_currency(&app, Some("harbor_currency=EUR"), None).await,
        "EUR"
    );
}

#[tokio::test]
async fn test_htmx_selection_saves_and_refreshes() {
    let app = TestApp::new();
    let request = Request::builder()
        .method("POST")
        .uri("/currency")
        .header(header::HOST, TEST_HOST)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header("HX-Request", "true")
        .body(Body::from("currency=pln"))
        .unwrap();
    let resp = app.send(request).await;

    assert_eq!(resp.status, StatusCode::NO_CONTENT);
    assert_eq!(resp.header("HX-Refresh"), Some("true"));

    let cookies = resp.set_cookies(CURRENCY_COOKIE);
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].starts_with("harbor_currency=PLN"));

    let pair = resp.cookie_pair(CURRENCY_COOKIE).unwrap();
    assert_eq!(active_currency(&app, Some(&pair), Some("de-DE")).await, "PLN");
}

#[tokio::test]
async fn test_form_selection_redirects_to_local_paths_only() {
    let app = TestApp::new();

    let resp = app
        .send(post_form("/currency", "currency=EUR&return_to=%2Fcart", None))
        .await;
    assert!(resp.status.is_redirection());
    assert_eq!(resp.header("location"), Some("/cart"));

    let resp = app
        .send(post_form(
            "/currency",
            "currency=EUR&return_to=%2F%2Fevil.example",
            None,
        ))
        .await;
    assert_eq!(resp.header("location"), Some("/"));
}
