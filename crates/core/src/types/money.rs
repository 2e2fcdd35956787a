//! Type-safe price representation using decimal arithmetic.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::CurrencyCode;

/// A monetary amount in a specific currency.
///
/// Amounts are kept as [`Decimal`] in the currency's standard unit (dollars,
/// not cents). Serialised amounts are strings so no precision is lost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Amount in the currency's standard unit.
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Money {
    /// Create a new amount.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// A zero amount in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::ZERO, currency_code)
    }

    /// Format for display with two decimal places, e.g. `$19.99` or `49.00 zł`.
    #[must_use]
    pub fn display(&self) -> String {
        let (symbol, suffix) = self.currency_code.symbol();
        if suffix {
            format!("{:.2} {symbol}", self.amount)
        } else {
            format!("{symbol}{:.2}", self.amount)
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::parse(s).unwrap()
    }

    #[test]
    fn test_display_prefix_symbol() {
        let money = Money::new(Decimal::new(1999, 2), code("USD"));
        assert_eq!(money.display(), "$19.99");
    }

    #[test]
    fn test_display_pads_to_two_places() {
        let money = Money::new(Decimal::new(49, 0), code("PLN"));
        assert_eq!(money.display(), "49.00 zł");
    }

    #[test]
    fn test_zero() {
        assert_eq!(Money::zero(code("EUR")).display(), "€0.00");
    }

    #[test]
    fn test_amount_serialises_as_string() {
        let money = Money::new(Decimal::new(1050, 2), code("EUR"));
        let json = serde_json::to_value(&money).unwrap();
        assert_eq!(json["amount"], "10.50");
        assert_eq!(json["currency_code"], "EUR");
    }
}
