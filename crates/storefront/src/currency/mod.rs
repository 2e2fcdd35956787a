//! Currency preference: which currency prices are shown in.
//!
//! The active currency is resolved once per request from, in order:
//!
//! 1. the currency cookie, when it holds a supported code;
//! 2. the browser locale (`Accept-Language`), when it maps to a supported code;
//! 3. the shop's base currency.
//!
//! [`CurrencyStore`] owns the `unresolved -> resolved` transition and the
//! cookie write-back. [`resolve`] is the pure precedence chain it runs.

pub mod cookie;
mod resolve;
mod shop;
mod store;

pub use cookie::{CookieError, CurrencyCookie, InMemoryCurrencyCookie, RequestCurrencyCookie};
pub use resolve::{CurrencySource, Resolution, resolve};
pub use shop::ShopCurrencies;
pub use store::{CurrencyError, CurrencyStore};

use harbor_core::CurrencyCode;

/// The currency resolved for the current request.
///
/// Inserted into request extensions by the currency middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveCurrency(pub CurrencyCode);
