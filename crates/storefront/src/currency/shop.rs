//! The shop's currency settings.

use std::collections::HashMap;

use harbor_core::{CurrencyCode, Locale, currency_for_region};

use crate::config::CurrencyConfig;

/// Base and supported currencies plus locale overrides.
///
/// `supported` is an ordered set that always contains `base`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopCurrencies {
    base: CurrencyCode,
    supported: Vec<CurrencyCode>,
    locale_overrides: HashMap<String, CurrencyCode>,
}

impl ShopCurrencies {
    /// Build from a base currency and a supported list.
    ///
    /// Duplicates are dropped keeping first position; the base currency is
    /// prepended when the list does not contain it.
    #[must_use]
    pub fn new(base: CurrencyCode, supported: impl IntoIterator<Item = CurrencyCode>) -> Self {
        let mut list: Vec<CurrencyCode> = Vec::new();
        for code in supported {
            if !list.contains(&code) {
                list.push(code);
            }
        }
        if !list.contains(&base) {
            list.insert(0, base.clone());
        }

        Self {
            base,
            supported: list,
            locale_overrides: HashMap::new(),
        }
    }

    /// Add locale → currency overrides, keyed by a tag (`pl-PL`) or a
    /// language (`de`). Keys are matched case-insensitively.
    #[must_use]
    pub fn with_locale_overrides(mut self, overrides: HashMap<String, CurrencyCode>) -> Self {
        self.locale_overrides = overrides
            .into_iter()
            .map(|(k, v)| (normalize_tag(&k), v))
            .collect();
        self
    }

    /// Build from configuration, using `fallback_supported` when the
    /// configuration lists no supported currencies.
    #[must_use]
    pub fn from_config(config: &CurrencyConfig, fallback_supported: Vec<CurrencyCode>) -> Self {
        let supported = if config.supported.is_empty() {
            fallback_supported
        } else {
            config.supported.clone()
        };

        Self::new(config.base.clone(), supported)
            .with_locale_overrides(config.locale_currencies.clone())
    }

    /// The shop default currency.
    #[must_use]
    pub const fn base(&self) -> &CurrencyCode {
        &self.base
    }

    /// Currencies a shopper may select, base included.
    #[must_use]
    pub fn supported(&self) -> &[CurrencyCode] {
        &self.supported
    }

    /// Whether `code` may be made active.
    #[must_use]
    pub fn is_supported(&self, code: &CurrencyCode) -> bool {
        self.supported.contains(code)
    }

    /// Currencies a locale maps to, most specific first.
    ///
    /// Order: override for the exact tag, override for the language, then
    /// the built-in region table.
    #[must_use]
    pub fn candidates_for_locale(&self, locale: &Locale) -> Vec<CurrencyCode> {
        let mut candidates = Vec::with_capacity(3);

        if let Some(code) = self.locale_overrides.get(&normalize_tag(&locale.tag())) {
            candidates.push(code.clone());
        }
        if let Some(code) = self.locale_overrides.get(locale.language()) {
            candidates.push(code.clone());
        }
        if let Some(code) = locale
            .region()
            .and_then(currency_for_region)
            .and_then(|c| CurrencyCode::parse(c).ok())
        {
            candidates.push(code);
        }

        candidates
    }
}

fn normalize_tag(tag: &str) -> String {
    tag.trim().to_ascii_lowercase().replace('_', "-")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::parse(s).unwrap()
    }

    #[test]
    fn test_base_always_supported() {
        let shop = ShopCurrencies::new(code("USD"), vec![code("EUR"), code("PLN")]);
        assert_eq!(shop.supported(), &[code("USD"), code("EUR"), code("PLN")]);
        assert!(shop.is_supported(&code("USD")));
    }

    #[test]
    fn test_duplicates_removed_in_order() {
        let shop = ShopCurrencies::new(
            code("USD"),
            vec![code("EUR"), code("USD"), code("EUR"), code("PLN")],
        );
        assert_eq!(shop.supported(), &[code("EUR"), code("USD"), code("PLN")]);
    }

    #[test]
    fn test_candidates_order() {
        let shop = ShopCurrencies::new(code("USD"), vec![code("EUR"), code("PLN")])
            .with_locale_overrides(HashMap::from([
                ("PL_pl".to_string(), code("EUR")),
                ("pl".to_string(), code("USD")),
            ]));

        let locale = Locale::parse("pl-PL").unwrap();
        assert_eq!(
            shop.candidates_for_locale(&locale),
            vec![code("EUR"), code("USD"), code("PLN")]
        );
    }

    #[test]
    fn test_candidates_language_only_locale() {
        let shop = ShopCurrencies::new(code("USD"), vec![code("EUR")]);
        let locale = Locale::parse("de").unwrap();
        assert!(shop.candidates_for_locale(&locale).is_empty());
    }
}
