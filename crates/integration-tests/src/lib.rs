//! Integration tests for the Harbor storefront.
//!
//! Tests drive the assembled router in-process with `tower::ServiceExt`,
//! so no server, database or Shopify credentials are needed. The Storefront
//! API client points at a closed local port: every backend call fails with a
//! transport error after a fast retry schedule.
//!
//! ```bash
//! cargo test -p harbor-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use harbor_core::CurrencyCode;
use harbor_storefront::app;
use harbor_storefront::config::{CurrencyConfig, ShopifyStorefrontConfig, StorefrontConfig};
use harbor_storefront::currency::ShopCurrencies;
use harbor_storefront::shopify::StorefrontClient;
use harbor_storefront::shopify::retry::RetryPolicy;
use harbor_storefront::state::AppState;
use http_body_util::BodyExt;
use secrecy::SecretString;
use tower::ServiceExt;
use tower_sessions::MemoryStore;

/// Nothing listens here; connections are refused immediately.
pub const UNREACHABLE_ENDPOINT: &str = "http://127.0.0.1:9/graphql";

/// Host used for same-origin requests.
pub const TEST_HOST: &str = "shop.test";

/// Parse a currency code.
#[must_use]
pub fn code(raw: &str) -> CurrencyCode {
    CurrencyCode::parse(raw).unwrap()
}

/// Retry schedule short enough for tests.
#[must_use]
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
        read_max_retries: 2,
        write_max_retries: 1,
    }
}

/// Configuration for a USD shop that also sells in EUR and PLN.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: None,
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 3000,
        base_url: format!("http://{TEST_HOST}"),
        shopify: ShopifyStorefrontConfig {
            store: "harbor-test.myshopify.com".to_string(),
            api_version: "2026-01".to_string(),
            storefront_private_token: SecretString::from("test-token".to_string()),
        },
        currency: CurrencyConfig {
            base: code("USD"),
            supported: vec![code("USD"), code("EUR"), code("PLN")],
            locale_currencies: HashMap::new(),
            cookie_name: "harbor_currency".to_string(),
        },
        retry: fast_retry(),
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// A test application and the session store behind it.
pub struct TestApp {
    pub router: Router,
    pub sessions: MemoryStore,
}

impl TestApp {
    /// Build the app over a fresh in-memory session store.
    #[must_use]
    pub fn new() -> Self {
        let config = test_config();
        let client =
            StorefrontClient::with_endpoint(UNREACHABLE_ENDPOINT, "test-token", fast_retry());
        let currencies = ShopCurrencies::from_config(&config.currency, Vec::new());
        let state = AppState::new(config, client, currencies, None);
        let sessions = MemoryStore::default();

        Self {
            router: app(state, sessions.clone()),
            sessions,
        }
    }

    /// Send one request through the router.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();

        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// A fully buffered response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// `Set-Cookie` values for the cookie called `name`.
    #[must_use]
    pub fn set_cookies(&self, name: &str) -> Vec<String> {
        let prefix = format!("{name}=");
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter(|v| v.starts_with(&prefix))
            .map(str::to_string)
            .collect()
    }

    /// `name=value` pair of a cookie this response set, ready for a
    /// `Cookie` request header.
    #[must_use]
    pub fn cookie_pair(&self, name: &str) -> Option<String> {
        self.set_cookies(name)
            .into_iter()
            .next()
            .and_then(|v| v.split(';').next().map(str::to_string))
    }

    /// A response header as text.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Parse the body as JSON.
    #[must_use]
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

/// `GET uri` with optional `Cookie` and `Accept-Language` headers.
#[must_use]
pub fn get(uri: &str, cookie: Option<&str>, accept_language: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::HOST, TEST_HOST);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    if let Some(language) = accept_language {
        builder = builder.header(header::ACCEPT_LANGUAGE, language);
    }
    builder.body(Body::empty()).unwrap()
}

/// Form `POST` with an optional `Cookie` header.
#[must_use]
pub fn post_form(uri: &str, form: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::HOST, TEST_HOST)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(form.to_string())).unwrap()
}

/// JSON `POST` with optional `Origin` and `Cookie` headers.
#[must_use]
pub fn post_json(
    uri: &str,
    body: &serde_json::Value,
    origin: Option<&str>,
    cookie: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::HOST, TEST_HOST)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(origin) = origin {
        builder = builder.header(header::ORIGIN, origin);
    }
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Join cookie pairs into one `Cookie` header value.
#[must_use]
pub fn cookies(pairs: &[&str]) -> String {
    pairs.join("; ")
}
