//! Wishlist route handlers.
//!
//! The wishlist lives in the session (see [`crate::wishlist::session`]), so
//! every handler is load, mutate, save. Mutations return HTMX fragments and
//! fire `wishlist-updated` so badges elsewhere on the page refresh.

use std::str::FromStr;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Extension, Form, Json,
    extract::{Query, State},
    response::{AppendHeaders, IntoResponse, Response},
};
use harbor_core::{CurrencyCode, Money, WishlistId, WishlistItemId};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::CurrencyMenu;
use crate::currency::ActiveCurrency;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::state::AppState;
use crate::wishlist::{
    Wishlist, WishlistCollection, WishlistItem, WishlistItemInput, normalize_variant_id, persist,
    session as wishlist_session,
};

const WISHLIST_UPDATED: [(&str, &str); 1] = [("HX-Trigger", "wishlist-updated")];

// =============================================================================
// View Models
// =============================================================================

/// Wishlist item display data for templates.
#[derive(Debug, Clone)]
pub struct WishlistItemView {
    pub id: String,
    pub product_id: String,
    pub variant_id: Option<String>,
    pub title: String,
    pub variant_title: Option<String>,
    pub handle: String,
    pub image_url: Option<String>,
    pub price: Option<String>,
    pub price_at_add: Option<String>,
    pub on_sale: bool,
}

impl From<&WishlistItem> for WishlistItemView {
    fn from(item: &WishlistItem) -> Self {
        Self {
            id: item.id.to_string(),
            product_id: item.product_id.clone(),
            variant_id: item.variant_id.clone(),
            title: item.title.clone(),
            variant_title: item.variant_title.clone(),
            handle: item.handle.clone(),
            image_url: item.image_url.clone(),
            price: item.price.as_ref().map(Money::display),
            price_at_add: item.price_at_add.as_ref().map(Money::display),
            on_sale: item.is_on_sale(),
        }
    }
}

/// Wishlist display data for templates.
#[derive(Debug, Clone)]
pub struct WishlistView {
    pub id: String,
    pub name: String,
    pub is_public: bool,
    pub item_count: u32,
    pub items: Vec<WishlistItemView>,
}

impl From<&Wishlist> for WishlistView {
    fn from(wishlist: &Wishlist) -> Self {
        Self {
            id: wishlist.id.to_string(),
            name: wishlist.name.clone(),
            is_public: wishlist.is_public,
            item_count: wishlist.item_count,
            items: wishlist.items.iter().map(WishlistItemView::from).collect(),
        }
    }
}

fn views(collection: &WishlistCollection) -> Vec<WishlistView> {
    collection.wishlists().iter().map(WishlistView::from).collect()
}

// =============================================================================
// Templates
// =============================================================================

/// Wishlist page template.
#[derive(Template, WebTemplate)]
#[template(path = "wishlist/show.html")]
pub struct WishlistShowTemplate {
    pub wishlists: Vec<WishlistView>,
    pub currency: CurrencyMenu,
}

/// Wishlists fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/wishlists.html")]
pub struct WishlistsTemplate {
    pub wishlists: Vec<WishlistView>,
}

/// Save/saved toggle button fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/wishlist_button.html")]
pub struct WishlistButtonTemplate {
    pub product_id: String,
    pub variant_id: Option<String>,
    pub saved: bool,
}

fn lists_fragment(collection: &WishlistCollection) -> Response {
    (
        AppendHeaders(WISHLIST_UPDATED),
        WishlistsTemplate {
            wishlists: views(collection),
        },
    )
        .into_response()
}

// =============================================================================
// Forms
// =============================================================================

/// Add to wishlist form data.
#[derive(Debug, Deserialize)]
pub struct AddToWishlistForm {
    pub product_id: String,
    pub variant_id: Option<String>,
    pub wishlist_id: Option<String>,
    #[serde(default)]
    pub title: String,
    pub variant_title: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub handle: String,
    /// Decimal amount in the active currency, e.g. `19.99`.
    pub price: Option<String>,
    pub currency: Option<String>,
    /// Checkbox: present when ticked.
    pub notify_on_sale: Option<String>,
    pub notify_on_restock: Option<String>,
}

impl AddToWishlistForm {
    /// Convert to store input, pricing in `default_currency` unless the form
    /// names one.
    fn into_input(self, default_currency: &CurrencyCode) -> Result<WishlistItemInput> {
        if self.product_id.trim().is_empty() {
            return Err(AppError::BadRequest("product_id is required".to_string()));
        }

        let price = match non_blank(self.price) {
            Some(raw) => {
                let amount = Decimal::from_str(raw.trim())
                    .map_err(|_| AppError::BadRequest(format!("invalid price: {raw}")))?;
                let currency = match non_blank(self.currency) {
                    Some(code) => CurrencyCode::parse(&code)
                        .map_err(|e| AppError::BadRequest(e.to_string()))?,
                    None => default_currency.clone(),
                };
                Some(Money::new(amount, currency))
            }
            None => None,
        };

        Ok(WishlistItemInput {
            product_id: self.product_id.trim().to_string(),
            variant_id: normalize_variant_id(self.variant_id.as_deref()),
            title: self.title,
            variant_title: non_blank(self.variant_title),
            image_url: non_blank(self.image_url),
            handle: self.handle,
            price,
            notify_on_sale: self.notify_on_sale.is_some(),
            notify_on_restock: self.notify_on_restock.is_some(),
        })
    }
}

/// Remove from wishlist form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromWishlistForm {
    pub wishlist_id: String,
    pub item_id: String,
}

/// Form naming one wishlist.
#[derive(Debug, Deserialize)]
pub struct WishlistForm {
    pub wishlist_id: String,
}

/// Create wishlist form data.
#[derive(Debug, Deserialize)]
pub struct CreateWishlistForm {
    #[serde(default)]
    pub name: String,
    pub is_public: Option<String>,
}

/// Rename wishlist form data.
#[derive(Debug, Deserialize)]
pub struct RenameWishlistForm {
    pub wishlist_id: String,
    pub name: String,
}

/// Toggle button query.
#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub product_id: String,
    pub variant_id: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the wishlist page.
#[instrument(skip(state, session, active))]
pub async fn show(
    State(state): State<AppState>,
    Extension(active): Extension<ActiveCurrency>,
    session: Session,
) -> WishlistShowTemplate {
    let collection = wishlist_session::load(&session).await;
    WishlistShowTemplate {
        wishlists: views(&collection),
        currency: CurrencyMenu::new(&state.currencies(), &active.0),
    }
}

/// Add or refresh an item (HTMX).
///
/// Returns the toggle button in its saved state.
#[instrument(skip(session, active))]
pub async fn add(
    Extension(active): Extension<ActiveCurrency>,
    session: Session,
    Form(form): Form<AddToWishlistForm>,
) -> Result<Response> {
    let wishlist_id = non_blank(form.wishlist_id.clone()).map(WishlistId::new);
    let input = form.into_input(&active.0)?;
    let product_id = input.product_id.clone();
    let variant_id = input.variant_id.clone();

    let mut collection = wishlist_session::load(&session).await;
    collection.add_item(wishlist_id.as_ref(), input);
    wishlist_session::save(&session, &collection).await?;

    add_breadcrumb("wishlist", "Item saved", Some(&[("product_id", product_id.as_str())]));

    Ok((
        AppendHeaders(WISHLIST_UPDATED),
        WishlistButtonTemplate {
            product_id,
            variant_id,
            saved: true,
        },
    )
        .into_response())
}

/// Remove an item (HTMX). Unknown ids are ignored.
#[instrument(skip(session))]
pub async fn remove(
    session: Session,
    Form(form): Form<RemoveFromWishlistForm>,
) -> Result<Response> {
    let mut collection = wishlist_session::load(&session).await;
    if collection.remove_item(
        &WishlistId::new(form.wishlist_id),
        &WishlistItemId::new(form.item_id),
    ) {
        wishlist_session::save(&session, &collection).await?;
    }
    Ok(lists_fragment(&collection))
}

/// Remove every item from one wishlist (HTMX).
#[instrument(skip(session))]
pub async fn clear(session: Session, Form(form): Form<WishlistForm>) -> Result<Response> {
    let mut collection = wishlist_session::load(&session).await;
    collection.clear(&WishlistId::new(form.wishlist_id));
    wishlist_session::save(&session, &collection).await?;
    Ok(lists_fragment(&collection))
}

/// Create a named wishlist (HTMX).
#[instrument(skip(session))]
pub async fn create(session: Session, Form(form): Form<CreateWishlistForm>) -> Result<Response> {
    let mut collection = wishlist_session::load(&session).await;
    collection.create_wishlist(&form.name, form.is_public.is_some());
    wishlist_session::save(&session, &collection).await?;

    add_breadcrumb("wishlist", "Wishlist created", None);
    Ok(lists_fragment(&collection))
}

/// Rename a wishlist (HTMX).
#[instrument(skip(session))]
pub async fn rename(session: Session, Form(form): Form<RenameWishlistForm>) -> Result<Response> {
    if form.name.trim().is_empty() {
        return Err(AppError::BadRequest("name is required".to_string()));
    }

    let mut collection = wishlist_session::load(&session).await;
    if !collection.rename(&WishlistId::new(form.wishlist_id.clone()), &form.name) {
        return Err(AppError::NotFound(format!("wishlist {}", form.wishlist_id)));
    }
    wishlist_session::save(&session, &collection).await?;
    Ok(lists_fragment(&collection))
}

/// Delete a wishlist and its items (HTMX).
#[instrument(skip(session))]
pub async fn delete(session: Session, Form(form): Form<WishlistForm>) -> Result<Response> {
    let mut collection = wishlist_session::load(&session).await;
    if !collection.delete_wishlist(&WishlistId::new(form.wishlist_id.clone())) {
        return Err(AppError::NotFound(format!("wishlist {}", form.wishlist_id)));
    }
    wishlist_session::save(&session, &collection).await?;

    add_breadcrumb("wishlist", "Wishlist deleted", None);
    Ok(lists_fragment(&collection))
}

/// Toggle button for a product/variant (HTMX).
#[instrument(skip(session))]
pub async fn status(session: Session, Query(query): Query<StatusQuery>) -> WishlistButtonTemplate {
    let collection = wishlist_session::load(&session).await;
    let variant_id = normalize_variant_id(query.variant_id.as_deref());
    let saved = collection.is_in_wishlist(&query.product_id, variant_id.as_deref());

    WishlistButtonTemplate {
        product_id: query.product_id,
        variant_id,
        saved,
    }
}

/// The stored envelope, for export or client-side rendering.
#[instrument(skip(session))]
pub async fn export(session: Session) -> Result<Json<serde_json::Value>> {
    let collection = wishlist_session::load(&session).await;
    Ok(Json(persist::encode(&collection)?))
}

/// Merge an exported envelope (any supported version) into this session.
#[instrument(skip(session, body))]
pub async fn import(
    session: Session,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>> {
    let incoming = persist::decode(body).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let mut collection = wishlist_session::load(&session).await;
    collection.merge(incoming);
    wishlist_session::save(&session, &collection).await?;

    add_breadcrumb("wishlist", "Wishlist imported", None);
    Ok(Json(persist::encode(&collection)?))
}
