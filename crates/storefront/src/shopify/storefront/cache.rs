//! Cache types for Storefront API responses.
//!
//! Carts are never cached; they are mutable and the backend is authoritative.

use crate::shopify::types::ShopLocalization;

/// Cache key for shop localization.
pub const LOCALIZATION_KEY: &str = "shop:localization";

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Localization(Box<ShopLocalization>),
}
