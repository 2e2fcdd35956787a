//! Domain types for Shopify Storefront API.
//!
//! These types provide a clean, ergonomic API separate from the raw wire
//! types in `storefront::queries`.

use harbor_core::{CurrencyCode, Money};
use serde::{Deserialize, Serialize};

// =============================================================================
// Image Types
// =============================================================================

/// Product or variant image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Image URL.
    pub url: String,
    /// Alt text for accessibility.
    pub alt_text: Option<String>,
}

// =============================================================================
// Cart Types
// =============================================================================

/// Variant and product details for a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartMerchandise {
    /// Variant ID.
    pub variant_id: String,
    /// Variant title ("Default Title" for single-variant products).
    pub variant_title: String,
    /// Variant image.
    pub image: Option<Image>,
    /// Parent product ID.
    pub product_id: String,
    /// Parent product handle.
    pub product_handle: String,
    /// Parent product title.
    pub product_title: String,
}

/// A line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Line ID.
    pub id: String,
    /// Quantity.
    pub quantity: u32,
    /// Price of one unit.
    pub unit_price: Money,
    /// Price of the whole line after line-level discounts.
    pub line_total: Money,
    /// What was added.
    pub merchandise: CartMerchandise,
}

/// Cart cost breakdown as computed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartCost {
    /// Subtotal before taxes and shipping.
    pub subtotal: Money,
    /// Total the buyer pays at checkout.
    pub total: Money,
    /// Estimated tax, when the backend provides it.
    pub total_tax: Option<Money>,
}

/// Discount code applied to a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartDiscountCode {
    /// The code as entered.
    pub code: String,
    /// Whether it applies to the current cart contents.
    pub applicable: bool,
}

/// A shopping cart, exactly as the backend last returned it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    /// Cart ID.
    pub id: String,
    /// Hosted checkout URL.
    pub checkout_url: String,
    /// Total number of units across all lines.
    pub total_quantity: u32,
    /// Buyer note.
    pub note: Option<String>,
    /// Last update timestamp (ISO 8601).
    pub updated_at: Option<String>,
    /// Cost breakdown.
    pub cost: CartCost,
    /// Discount codes on the cart.
    pub discount_codes: Vec<CartDiscountCode>,
    /// Cart lines.
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Currency the cart is priced in.
    #[must_use]
    pub const fn currency(&self) -> &CurrencyCode {
        &self.cost.total.currency_code
    }
}

/// Input for adding a line to a cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLineInput {
    /// Variant ID.
    pub merchandise_id: String,
    /// Quantity to add.
    pub quantity: u32,
}

impl CartLineInput {
    /// Create a line input.
    #[must_use]
    pub fn new(merchandise_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            merchandise_id: merchandise_id.into(),
            quantity,
        }
    }
}

/// Input for changing the quantity of an existing line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLineUpdateInput {
    /// Line ID.
    pub id: String,
    /// New quantity (0 removes the line).
    pub quantity: u32,
}

// =============================================================================
// Localization Types
// =============================================================================

/// Currencies the shop sells in, as reported by the Storefront API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopLocalization {
    /// Country the request was localized for.
    pub country_code: String,
    /// Currency of that country.
    pub currency: CurrencyCode,
    /// Distinct currencies across all available countries, in first-seen order.
    pub available_currencies: Vec<CurrencyCode>,
}
