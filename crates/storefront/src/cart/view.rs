//! Template projection of a backend cart.

use harbor_core::{CurrencyCode, Money};

use super::CartSnapshot;
use crate::shopify::{Cart, CartLine};

/// Cart line display data for templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItemView {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub variant_title: Option<String>,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
    pub image_url: Option<String>,
}

impl From<&CartLine> for CartItemView {
    fn from(line: &CartLine) -> Self {
        let merchandise = &line.merchandise;
        Self {
            id: line.id.clone(),
            handle: merchandise.product_handle.clone(),
            title: merchandise.product_title.clone(),
            variant_title: (merchandise.variant_title != "Default Title")
                .then(|| merchandise.variant_title.clone()),
            quantity: line.quantity,
            price: line.unit_price.display(),
            line_price: line.line_total.display(),
            image_url: merchandise.image.as_ref().map(|img| img.url.clone()),
        }
    }
}

/// Discount code display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscountCodeView {
    pub code: String,
    pub applicable: bool,
}

/// Cart display data for templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: u32,
    pub subtotal: String,
    pub total: String,
    pub tax: Option<String>,
    pub discount_codes: Vec<DiscountCodeView>,
    pub currency: String,
    pub checkout_url: Option<String>,
    /// A mutation for this cart is still in flight.
    pub pending: bool,
}

impl CartView {
    /// An empty cart priced in `currency`.
    #[must_use]
    pub fn empty(currency: &CurrencyCode) -> Self {
        let zero = Money::zero(currency.clone()).display();
        Self {
            items: Vec::new(),
            item_count: 0,
            subtotal: zero.clone(),
            total: zero,
            tax: None,
            discount_codes: Vec::new(),
            currency: currency.to_string(),
            checkout_url: None,
            pending: false,
        }
    }

    /// Project a backend cart.
    #[must_use]
    pub fn from_cart(cart: &Cart, pending: bool) -> Self {
        Self {
            items: cart.lines.iter().map(CartItemView::from).collect(),
            item_count: cart.total_quantity,
            subtotal: cart.cost.subtotal.display(),
            total: cart.cost.total.display(),
            tax: cart.cost.total_tax.as_ref().map(Money::display),
            discount_codes: cart
                .discount_codes
                .iter()
                .map(|d| DiscountCodeView {
                    code: d.code.clone(),
                    applicable: d.applicable,
                })
                .collect(),
            currency: cart.currency().to_string(),
            checkout_url: Some(cart.checkout_url.clone()),
            pending,
        }
    }

    /// Project a snapshot, falling back to an empty cart in `currency`.
    #[must_use]
    pub fn from_snapshot(snapshot: &CartSnapshot, currency: &CurrencyCode) -> Self {
        snapshot.cart.as_ref().map_or_else(
            || Self {
                pending: snapshot.pending,
                ..Self::empty(currency)
            },
            |cart| Self::from_cart(cart, snapshot.pending),
        )
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
