//! Cart handlers when the Storefront API cannot be reached.
//!
//! The test client points at a closed port, so every call ends as a
//! transport failure once retries are exhausted.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::collections::HashMap;

use axum::http::StatusCode;
use harbor_integration_tests::{TestApp, get, post_form};
use serde_json::{Value, json};
use tower_sessions::SessionStore;
use tower_sessions::cookie::time::{Duration, OffsetDateTime};
use tower_sessions::session::{Id, Record};

fn notice(resp_header: Option<&str>) -> Value {
    serde_json::from_str::<Value>(resp_header.unwrap()).unwrap()["notify"].clone()
}

/// Store a session that already holds a cart id and return its cookie.
async fn session_with_cart(app: &TestApp) -> String {
    let mut record = Record {
        id: Id::default(),
        data: HashMap::from([("cart_id".to_string(), json!("gid://shopify/Cart/abc"))]),
        expiry_date: OffsetDateTime::now_utc() + Duration::days(1),
    };
    app.sessions.create(&mut record).await.unwrap();
    format!("harbor_session={}", record.id)
}

#[tokio::test]
async fn test_empty_cart_page_needs_no_backend() {
    let app = TestApp::new();
    let resp = app
        .send(get("/cart", Some("harbor_currency=PLN"), None))
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("Your cart is empty"));
    assert!(resp.header("HX-Trigger").is_none());
}

#[tokio::test]
async fn test_add_failure_keeps_count_and_notifies_once() {
    let app = TestApp::new();
    let resp = app
        .send(post_form(
            "/cart/add",
            "variant_id=gid%3A%2F%2Fshopify%2FProductVariant%2F1&quantity=2",
            None,
        ))
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.headers.get_all("HX-Trigger").iter().count(), 1);

    let notify = notice(resp.header("HX-Trigger"));
    assert_eq!(notify["level"], "error");
    assert_eq!(notify["message"], "Something went wrong. Please try again.");
    assert_eq!(notify["reload"], false);
    assert!(!resp.body.contains("badge"));
}

#[tokio::test]
async fn test_cart_read_failure_shows_connectivity_notice() {
    let app = TestApp::new();
    let cookie = session_with_cart(&app).await;

    let resp = app.send(get("/cart", Some(&cookie), None)).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("Your cart is empty"));

    let notify = notice(resp.header("HX-Trigger"));
    assert_eq!(notify["level"], "error");
    assert_eq!(notify["dismissible"], true);
    assert_eq!(notify["reload"], true);
}

#[tokio::test]
async fn test_update_failure_renders_last_confirmed_state() {
    let app = TestApp::new();
    let cookie = session_with_cart(&app).await;

    let resp = app
        .send(post_form(
            "/cart/update",
            "line_id=gid%3A%2F%2Fshopify%2FCartLine%2F1&quantity=3",
            Some(&cookie),
        ))
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("Your cart is empty"));
    assert_eq!(
        notice(resp.header("HX-Trigger"))["message"],
        "Something went wrong. Please try again."
    );
}

#[tokio::test]
async fn test_checkout_without_cart_redirects_to_cart() {
    let app = TestApp::new();
    let resp = app.send(get("/checkout", None, None)).await;

    assert!(resp.status.is_redirection());
    assert_eq!(resp.header("location"), Some("/cart"));
}
