//! The currency precedence chain.

use harbor_core::{CurrencyCode, Locale};

use super::ShopCurrencies;

/// Which step of the chain produced the active currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrencySource {
    /// A supported code saved in the currency cookie.
    Cookie,
    /// Mapped from the browser locale.
    Locale,
    /// The shop base currency.
    ShopDefault,
    /// Chosen explicitly by the shopper.
    Selected,
}

/// Outcome of resolving the active currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub currency: CurrencyCode,
    pub source: CurrencySource,
}

/// Resolve the active currency. Pure.
///
/// A saved value that fails to parse or is not supported is ignored, as is
/// a locale whose mapped currencies are all unsupported.
#[must_use]
pub fn resolve(shop: &ShopCurrencies, saved: Option<&str>, locale: Option<&Locale>) -> Resolution {
    if let Some(code) = saved
        .and_then(|s| CurrencyCode::parse(s).ok())
        .filter(|c| shop.is_supported(c))
    {
        return Resolution {
            currency: code,
            source: CurrencySource::Cookie,
        };
    }

    if let Some(code) = locale.and_then(|l| {
        shop.candidates_for_locale(l)
            .into_iter()
            .find(|c| shop.is_supported(c))
    }) {
        return Resolution {
            currency: code,
            source: CurrencySource::Locale,
        };
    }

    Resolution {
        currency: shop.base().clone(),
        source: CurrencySource::ShopDefault,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::parse(s).unwrap()
    }

    fn shop() -> ShopCurrencies {
        ShopCurrencies::new(code("PLN"), vec![code("PLN"), code("EUR"), code("USD")])
    }

    #[test]
    fn test_cookie_wins() {
        let locale = Locale::parse("en-US").unwrap();
        let r = resolve(&shop(), Some("EUR"), Some(&locale));
        assert_eq!(r.currency, code("EUR"));
        assert_eq!(r.source, CurrencySource::Cookie);
    }

    #[test]
    fn test_locale_when_no_cookie() {
        let locale = Locale::parse("en-US").unwrap();
        let r = resolve(&shop(), None, Some(&locale));
        assert_eq!(r.currency, code("USD"));
        assert_eq!(r.source, CurrencySource::Locale);
    }

    #[test]
    fn test_base_when_nothing_matches() {
        let r = resolve(&shop(), None, None);
        assert_eq!(r.currency, code("PLN"));
        assert_eq!(r.source, CurrencySource::ShopDefault);
    }

    #[test]
    fn test_unsupported_cookie_falls_through() {
        let locale = Locale::parse("de-DE").unwrap();
        let r = resolve(&shop(), Some("GBP"), Some(&locale));
        assert_eq!(r.currency, code("EUR"));
        assert_eq!(r.source, CurrencySource::Locale);
    }

    #[test]
    fn test_malformed_cookie_falls_through() {
        let r = resolve(&shop(), Some("euro"), None);
        assert_eq!(r.source, CurrencySource::ShopDefault);
    }

    #[test]
    fn test_unsupported_locale_currency_uses_base() {
        let locale = Locale::parse("en-GB").unwrap();
        let r = resolve(&shop(), None, Some(&locale));
        assert_eq!(r.currency, code("PLN"));
        assert_eq!(r.source, CurrencySource::ShopDefault);
    }
}
