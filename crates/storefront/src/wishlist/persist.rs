//! Versioned storage format for wishlist collections.
//!
//! Stored as `{ "version": N, "payload": ... }`. Older payloads are upgraded
//! one version at a time until they reach [`CURRENT_VERSION`].
//!
//! - v1: a single flat list of items with a string price and currency.
//! - v2: named wishlists with `Money` prices and `price_at_add` snapshots.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use harbor_core::{CurrencyCode, Money, WishlistItemId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use super::{DEFAULT_WISHLIST_NAME, WishlistCollection, WishlistItem, normalize_variant_id};

/// Version written by [`encode`].
pub const CURRENT_VERSION: u32 = 2;

/// Errors reading or writing a stored wishlist.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("unsupported wishlist format version {0}")]
    UnsupportedVersion(u32),

    #[error("malformed wishlist data: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    version: u32,
    payload: Value,
}

/// Wrap a collection in the current envelope.
///
/// # Errors
///
/// Returns an error if the collection cannot be serialized.
pub fn encode(collection: &WishlistCollection) -> Result<Value, PersistError> {
    Ok(serde_json::to_value(Envelope {
        version: CURRENT_VERSION,
        payload: serde_json::to_value(collection)?,
    })?)
}

/// Read an envelope of any known version.
///
/// # Errors
///
/// Returns an error for unknown versions or payloads that do not match
/// their declared version.
pub fn decode(value: Value) -> Result<WishlistCollection, PersistError> {
    let Envelope {
        mut version,
        mut payload,
    } = serde_json::from_value(value)?;

    if version == 0 || version > CURRENT_VERSION {
        return Err(PersistError::UnsupportedVersion(version));
    }

    while version < CURRENT_VERSION {
        payload = match version {
            1 => upgrade_v1(payload)?,
            other => return Err(PersistError::UnsupportedVersion(other)),
        };
        version += 1;
    }

    let mut collection: WishlistCollection = serde_json::from_value(payload)?;
    collection.normalize();
    Ok(collection)
}

/// Like [`decode`], but logs and discards unreadable data.
#[must_use]
pub fn decode_or_empty(value: Value) -> WishlistCollection {
    decode(value).unwrap_or_else(|e| {
        warn!(error = %e, "Discarding unreadable stored wishlist");
        WishlistCollection::default()
    })
}

// =============================================================================
// v1 -> v2
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct V1Payload {
    #[serde(default)]
    items: Vec<V1Item>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct V1Item {
    product_id: String,
    variant_id: Option<String>,
    title: String,
    handle: String,
    image_url: Option<String>,
    price: Option<String>,
    currency_code: Option<String>,
    added_at: Option<DateTime<Utc>>,
}

impl V1Item {
    fn money(&self) -> Option<Money> {
        let amount = Decimal::from_str(self.price.as_deref()?.trim()).ok()?;
        let currency = CurrencyCode::parse(self.currency_code.as_deref()?).ok()?;
        Some(Money::new(amount, currency))
    }
}

fn upgrade_v1(payload: Value) -> Result<Value, PersistError> {
    let v1: V1Payload = serde_json::from_value(payload)?;
    let mut collection = WishlistCollection::default();

    if !v1.items.is_empty() {
        let id = collection.create_wishlist(DEFAULT_WISHLIST_NAME, false);
        if let Some(wishlist) = collection.wishlists.iter_mut().find(|w| w.id == id) {
            let now = Utc::now();
            wishlist.items = v1
                .items
                .into_iter()
                .map(|item| {
                    let price = item.money();
                    WishlistItem {
                        id: WishlistItemId::generate_local(),
                        variant_id: normalize_variant_id(item.variant_id.as_deref()),
                        product_id: item.product_id,
                        title: item.title,
                        variant_title: None,
                        image_url: item.image_url,
                        handle: item.handle,
                        price_at_add: price.clone(),
                        price,
                        notify_on_sale: false,
                        notify_on_restock: false,
                        added_at: item.added_at.unwrap_or(now),
                    }
                })
                .collect();
        }
    }

    Ok(serde_json::to_value(collection)?)
}
