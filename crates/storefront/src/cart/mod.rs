//! Server-authoritative cart state.
//!
//! The backend owns the cart: totals, quantities and discounts shown to the
//! shopper are always taken from its last response, never computed here.
//! [`CartSync`] decides which response is displayed when mutations overlap.

mod sync;
mod view;

pub use sync::{CartRegistry, CartSnapshot, CartSync, MutationTicket};
pub use view::{CartItemView, CartView, DiscountCodeView};
