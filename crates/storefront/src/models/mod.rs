//! Types stored in the session.

/// Session keys for storefront data.
pub mod session_keys {
    /// Key for storing the Shopify cart ID.
    pub const CART_ID: &str = "cart_id";

    /// Key for the versioned wishlist envelope.
    pub const WISHLIST: &str = "wishlist";
}
