//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check
//!
//! # Currency
//! POST /currency               - Select the active currency
//! GET  /api/currency           - Active, base and supported currencies (JSON)
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add to cart (returns count badge, triggers cart-updated)
//! POST /cart/update            - Update quantity (returns cart_items fragment)
//! POST /cart/remove            - Remove item (returns cart_items fragment)
//! POST /cart/discount          - Apply or clear a discount code (cart_items fragment)
//! GET  /cart/count             - Cart count badge (fragment)
//! GET  /checkout               - Redirect to Shopify checkout
//!
//! # Wishlist
//! GET  /wishlist               - Wishlist page
//! POST /wishlist/add           - Add or refresh an item (returns toggle button)
//! POST /wishlist/remove        - Remove an item (returns lists fragment)
//! POST /wishlist/clear         - Empty a wishlist (returns lists fragment)
//! POST /wishlist/create        - Create a named wishlist (returns lists fragment)
//! POST /wishlist/rename        - Rename a wishlist (returns lists fragment)
//! POST /wishlist/delete        - Delete a wishlist (returns lists fragment)
//! GET  /wishlist/status        - Toggle button for a product/variant (fragment)
//! GET  /api/wishlist           - Stored wishlist envelope (JSON)
//! POST /api/wishlist/import    - Merge an exported envelope into this session
//!
//! # Customer access token cookie
//! POST /api/auth/session       - Set the HTTP-only access token cookie
//! POST /api/auth/logout        - Clear it
//! ```

pub mod api;
pub mod cart;
pub mod currency;
pub mod health;
pub mod wishlist;

use axum::{
    Router,
    http::HeaderMap,
    routing::{get, post},
};
use harbor_core::CurrencyCode;

use crate::currency::ShopCurrencies;
use crate::state::AppState;

/// Whether a request was issued by HTMX.
#[must_use]
pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers.get("HX-Request").is_some_and(|v| v == "true")
}

/// One entry in the header currency selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyOption {
    pub code: String,
    pub selected: bool,
}

/// Currency selector data shared by full-page templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyMenu {
    pub active: String,
    pub options: Vec<CurrencyOption>,
}

impl CurrencyMenu {
    /// Build the selector for the active currency.
    #[must_use]
    pub fn new(shop: &ShopCurrencies, active: &CurrencyCode) -> Self {
        Self {
            active: active.to_string(),
            options: shop
                .supported()
                .iter()
                .map(|code| CurrencyOption {
                    code: code.to_string(),
                    selected: code == active,
                })
                .collect(),
        }
    }
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/discount", post(cart::discount))
        .route("/count", get(cart::count))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::show))
        .route("/add", post(wishlist::add))
        .route("/remove", post(wishlist::remove))
        .route("/clear", post(wishlist::clear))
        .route("/create", post(wishlist::create))
        .route("/rename", post(wishlist::rename))
        .route("/delete", post(wishlist::delete))
        .route("/status", get(wishlist::status))
}

/// Create the JSON API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/currency", get(currency::show))
        .route("/wishlist", get(wishlist::export))
        .route("/wishlist/import", post(wishlist::import))
        .route("/auth/session", post(api::session_token::create))
        .route("/auth/logout", post(api::session_token::logout))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/currency", post(currency::set))
        .nest("/cart", cart_routes())
        .route("/checkout", get(cart::checkout))
        .nest("/wishlist", wishlist_routes())
        .nest("/api", api_routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_currency_menu_marks_active() {
        let usd = CurrencyCode::parse("USD").unwrap();
        let shop = ShopCurrencies::new(usd.clone(), vec![CurrencyCode::parse("EUR").unwrap()]);
        let menu = CurrencyMenu::new(&shop, &CurrencyCode::parse("EUR").unwrap());

        assert_eq!(menu.active, "EUR");
        assert_eq!(menu.options.len(), 2);
        assert!(!menu.options[0].selected);
        assert!(menu.options[1].selected);
    }

    #[test]
    fn test_is_htmx() {
        let mut headers = HeaderMap::new();
        assert!(!is_htmx(&headers));
        headers.insert("HX-Request", HeaderValue::from_static("true"));
        assert!(is_htmx(&headers));
    }
}
