//! Shopper wishlists.
//!
//! A [`WishlistCollection`] holds one or more named wishlists. Items are
//! identified by `(product_id, variant_id)`; adding an existing key refreshes
//! the item instead of duplicating it.
//!
//! The collection lives in the browser session as a versioned envelope (see
//! [`persist`]), so guests keep their wishlist without an account.

pub mod persist;
pub mod session;
mod store;

pub use persist::PersistError;
pub use store::{
    DEFAULT_WISHLIST_NAME, Wishlist, WishlistCollection, WishlistItem, WishlistItemInput,
    normalize_variant_id,
};
