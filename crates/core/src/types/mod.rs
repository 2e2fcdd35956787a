//! Core types for Harbor.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod currency;
pub mod id;
pub mod locale;
pub mod money;

pub use currency::{CurrencyCode, CurrencyCodeError};
pub use id::*;
pub use locale::{Locale, currency_for_region};
pub use money::Money;
