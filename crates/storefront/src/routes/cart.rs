//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! Cart IDs are stored in the session and mapped to Shopify carts.
//!
//! Every mutation holds a ticket from the cart's [`CartSync`] tracker, so the
//! rendered cart is always the last confirmed backend state. A failed call
//! still answers 200 with that state plus a notice in `HX-Trigger`.

use std::future::Future;
use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Extension, Form,
    extract::State,
    http::HeaderMap,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use harbor_core::CurrencyCode;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::CurrencyMenu;
use super::api::session_token::read_access_token;
use crate::cart::{CartSnapshot, CartSync, CartView};
use crate::currency::ActiveCurrency;
use crate::error::add_breadcrumb;
use crate::models::session_keys;
use crate::notify::{HX_TRIGGER, Notice};
use crate::shopify::retry::OperationKind;
use crate::shopify::{Cart, CartLineInput, CartLineUpdateInput, ShopifyError, StorefrontClient};
use crate::state::AppState;

const CART_UPDATED: [(&str, &str); 1] = [(HX_TRIGGER, "cart-updated")];

// =============================================================================
// Session Helpers
// =============================================================================

/// Get the cart ID from the session.
async fn get_cart_id(session: &Session) -> Option<String> {
    session
        .get::<String>(session_keys::CART_ID)
        .await
        .ok()
        .flatten()
}

/// Set the cart ID in the session.
async fn set_cart_id(
    session: &Session,
    cart_id: &str,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CART_ID, cart_id).await
}

/// Drop a cart that no longer exists upstream.
async fn forget_cart(state: &AppState, session: &Session, cart_id: &str) {
    tracing::info!(cart_id, "Cart expired upstream, starting fresh");
    if let Err(e) = session.remove::<String>(session_keys::CART_ID).await {
        tracing::warn!("Failed to clear cart ID from session: {e}");
    }
    state.carts().forget(cart_id).await;
}

const fn empty_snapshot() -> CartSnapshot {
    CartSnapshot {
        cart: None,
        pending: false,
    }
}

// =============================================================================
// Forms and Templates
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub variant_id: String,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub line_id: String,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub line_id: String,
}

/// Discount code form data. A blank code clears all codes.
#[derive(Debug, Deserialize)]
pub struct DiscountForm {
    #[serde(default)]
    pub code: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
    pub currency: CurrencyMenu,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

impl CartCountTemplate {
    fn of(snapshot: &CartSnapshot) -> Self {
        Self {
            count: snapshot.cart.as_ref().map_or(0, |c| c.total_quantity),
        }
    }
}

// =============================================================================
// Reads
// =============================================================================

/// Fetch the session's cart and record it with its tracker.
///
/// Read failures fall back to the last confirmed cart with a connectivity
/// notice; an expired cart is dropped from the session.
async fn load_cart(state: &AppState, session: &Session) -> (CartSnapshot, Option<Notice>) {
    let Some(cart_id) = get_cart_id(session).await else {
        return (empty_snapshot(), None);
    };

    let tracker = state.carts().tracker(&cart_id).await;
    match state.storefront().get_cart(&cart_id).await {
        Ok(cart) => (tracker.observe(cart), None),
        Err(ShopifyError::NotFound(_)) => {
            forget_cart(state, session, &cart_id).await;
            (empty_snapshot(), None)
        }
        Err(e) => {
            tracing::warn!("Failed to fetch cart {cart_id}: {e}");
            (
                tracker.snapshot(),
                Notice::for_terminal_failure(OperationKind::Read, &e),
            )
        }
    }
}

/// Display cart page.
#[instrument(skip(state, session, active))]
pub async fn show(
    State(state): State<AppState>,
    Extension(ActiveCurrency(active)): Extension<ActiveCurrency>,
    session: Session,
) -> Response {
    let (snapshot, notice) = load_cart(&state, &session).await;

    (
        notice,
        CartShowTemplate {
            cart: CartView::from_snapshot(&snapshot, &active),
            currency: CurrencyMenu::new(&state.currencies(), &active),
        },
    )
        .into_response()
}

/// Get cart count badge (HTMX).
#[instrument(skip(state, session))]
pub async fn count(State(state): State<AppState>, session: Session) -> Response {
    let (snapshot, notice) = load_cart(&state, &session).await;
    (notice, CartCountTemplate::of(&snapshot)).into_response()
}

/// Redirect to Shopify checkout.
#[instrument(skip(state, session))]
pub async fn checkout(State(state): State<AppState>, session: Session) -> Response {
    let Some(cart_id) = get_cart_id(&session).await else {
        // No cart, redirect to cart page
        return Redirect::to("/cart").into_response();
    };

    match state.storefront().get_cart(&cart_id).await {
        Ok(cart) if cart.total_quantity > 0 => {
            add_breadcrumb("cart", "Checkout started", Some(&[("cart_id", cart_id.as_str())]));
            Redirect::to(&cart.checkout_url).into_response()
        }
        Ok(_) => Redirect::to("/cart").into_response(),
        Err(e) => {
            tracing::error!("Failed to get cart for checkout: {e}");
            Redirect::to("/cart").into_response()
        }
    }
}

// =============================================================================
// Mutations
// =============================================================================

/// Add item to cart (HTMX).
///
/// Creates a new cart if one doesn't exist (or the session's cart expired),
/// otherwise adds to the existing cart. Returns the count badge and fires
/// `cart-updated` on success.
#[instrument(skip(state, session, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let line = CartLineInput::new(form.variant_id, form.quantity.unwrap_or(1).max(1));
    add_breadcrumb(
        "cart",
        "Add to cart",
        Some(&[("variant_id", line.merchandise_id.as_str())]),
    );

    if let Some(cart_id) = get_cart_id(&session).await {
        let tracker = state.carts().tracker(&cart_id).await;
        let ticket = tracker.begin();

        match state
            .storefront()
            .add_to_cart(&cart_id, vec![line.clone()])
            .await
        {
            Ok(cart) => return added(&ticket.complete(cart)),
            Err(ShopifyError::NotFound(_)) => {
                ticket.fail();
                forget_cart(&state, &session, &cart_id).await;
            }
            Err(e) => {
                tracing::error!("Failed to add item to cart: {e}");
                let snapshot = ticket.fail();
                return failed_count(&snapshot, &e);
            }
        }
    }

    // Create new cart with this item
    let tracker = CartSync::new();
    let ticket = tracker.begin();
    let token = read_access_token(&headers);

    match state
        .storefront()
        .create_cart(vec![line], token.as_deref())
        .await
    {
        Ok(cart) => {
            if let Err(e) = set_cart_id(&session, &cart.id).await {
                tracing::error!("Failed to save cart ID to session: {e}");
            }
            state.carts().adopt(&cart.id, Arc::clone(&tracker)).await;
            added(&ticket.complete(cart))
        }
        Err(e) => {
            tracing::error!("Failed to create cart: {e}");
            let snapshot = ticket.fail();
            failed_count(&snapshot, &e)
        }
    }
}

fn added(snapshot: &CartSnapshot) -> Response {
    (
        AppendHeaders(CART_UPDATED),
        CartCountTemplate::of(snapshot),
    )
        .into_response()
}

fn failed_count(snapshot: &CartSnapshot, error: &ShopifyError) -> Response {
    (
        Notice::for_terminal_failure(OperationKind::Write, error),
        CartCountTemplate::of(snapshot),
    )
        .into_response()
}

/// Update cart item quantity (HTMX).
#[instrument(skip(state, session, active))]
pub async fn update(
    State(state): State<AppState>,
    Extension(ActiveCurrency(active)): Extension<ActiveCurrency>,
    session: Session,
    Form(form): Form<UpdateCartForm>,
) -> Response {
    let lines = vec![CartLineUpdateInput {
        id: form.line_id,
        quantity: form.quantity,
    }];

    mutate(&state, &session, &active, |client, cart_id| async move {
        client.update_cart(&cart_id, lines).await
    })
    .await
}

/// Remove item from cart (HTMX).
#[instrument(skip(state, session, active))]
pub async fn remove(
    State(state): State<AppState>,
    Extension(ActiveCurrency(active)): Extension<ActiveCurrency>,
    session: Session,
    Form(form): Form<RemoveFromCartForm>,
) -> Response {
    let line_ids = vec![form.line_id];

    mutate(&state, &session, &active, |client, cart_id| async move {
        client.remove_from_cart(&cart_id, line_ids).await
    })
    .await
}

/// Apply or clear a discount code (HTMX).
#[instrument(skip(state, session, active))]
pub async fn discount(
    State(state): State<AppState>,
    Extension(ActiveCurrency(active)): Extension<ActiveCurrency>,
    session: Session,
    Form(form): Form<DiscountForm>,
) -> Response {
    let code = form.code.trim();
    let codes = if code.is_empty() {
        Vec::new()
    } else {
        vec![code.to_string()]
    };

    mutate(&state, &session, &active, |client, cart_id| async move {
        client.update_discount_codes(&cart_id, codes).await
    })
    .await
}

/// Run one mutation against the session's cart and render the items fragment.
async fn mutate<F, Fut>(
    state: &AppState,
    session: &Session,
    currency: &CurrencyCode,
    operation: F,
) -> Response
where
    F: FnOnce(StorefrontClient, String) -> Fut,
    Fut: Future<Output = Result<Cart, ShopifyError>>,
{
    let Some(cart_id) = get_cart_id(session).await else {
        return CartItemsTemplate {
            cart: CartView::empty(currency),
        }
        .into_response();
    };

    let tracker = state.carts().tracker(&cart_id).await;
    let ticket = tracker.begin();

    match operation(state.storefront().clone(), cart_id.clone()).await {
        Ok(cart) => {
            let snapshot = ticket.complete(cart);
            (
                AppendHeaders(CART_UPDATED),
                CartItemsTemplate {
                    cart: CartView::from_snapshot(&snapshot, currency),
                },
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Cart mutation failed for {cart_id}: {e}");
            let mut snapshot = ticket.fail();
            if matches!(e, ShopifyError::NotFound(_)) {
                forget_cart(state, session, &cart_id).await;
                snapshot = empty_snapshot();
            }

            (
                Notice::for_terminal_failure(OperationKind::Write, &e),
                CartItemsTemplate {
                    cart: CartView::from_snapshot(&snapshot, currency),
                },
            )
                .into_response()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_count_of_empty_snapshot() {
        assert_eq!(CartCountTemplate::of(&empty_snapshot()).count, 0);
    }

    #[test]
    fn test_count_fragment_renders_badge() {
        let html = CartCountTemplate { count: 3 }.render().unwrap();
        assert!(html.contains('3'));
    }

    #[test]
    fn test_empty_items_fragment_renders() {
        let usd = CurrencyCode::parse("USD").unwrap();
        let html = CartItemsTemplate {
            cart: CartView::empty(&usd),
        }
        .render()
        .unwrap();
        assert!(html.contains("Your cart is empty"));
    }
}
