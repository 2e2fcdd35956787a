//! Harbor Storefront library.
//!
//! This crate provides the storefront functionality as a library,
//! allowing it to be tested and reused.
//!
//! # Modules
//!
//! - [`currency`] - Active currency resolution and the currency cookie
//! - [`wishlist`] - Session-stored named wishlists
//! - [`cart`] - Cart reconciliation and display projection
//! - [`shopify`] - Storefront API client with retry classification
//! - [`notify`] - Shopper-facing failure notices
//! - [`routes`] - HTTP handlers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod config;
pub mod currency;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod notify;
pub mod routes;
pub mod shopify;
pub mod state;
pub mod wishlist;

use axum::{Router, middleware::from_fn, middleware::from_fn_with_state};
use tower_http::trace::TraceLayer;
use tower_sessions::SessionStore;

use state::AppState;

/// Build the storefront router over `store` for sessions.
///
/// Layers run outermost first: trace, request id, security headers,
/// session, currency.
pub fn app<S>(state: AppState, store: S) -> Router
where
    S: SessionStore + Clone,
{
    let session_layer = middleware::create_session_layer(store, state.config().secure_cookies());

    routes::routes()
        .layer(from_fn_with_state(
            state.clone(),
            middleware::currency_middleware,
        ))
        .layer(session_layer)
        .layer(from_fn(middleware::security_headers_middleware))
        .layer(from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
