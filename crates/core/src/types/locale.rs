//! Browser locale parsing and the region to currency table.

use core::fmt;

/// A parsed language tag such as `pl-PL`, `en_US` or `de`.
///
/// Only the primary language subtag and an optional two-letter region are
/// kept; script and variant subtags are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locale {
    language: String,
    region: Option<String>,
}

impl Locale {
    /// Parse a language tag.
    ///
    /// Returns `None` for empty input, the `*` wildcard, or a primary subtag
    /// that is not 2-8 ASCII letters.
    #[must_use]
    pub fn parse(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        if tag.is_empty() || tag == "*" {
            return None;
        }

        let mut parts = tag.split(['-', '_']);
        let language = parts.next()?;
        if !(2..=8).contains(&language.len()) || !language.chars().all(|c| c.is_ascii_alphabetic())
        {
            return None;
        }

        let region = parts
            .find(|p| p.len() == 2 && p.chars().all(|c| c.is_ascii_alphabetic()))
            .map(str::to_ascii_uppercase);

        Some(Self {
            language: language.to_ascii_lowercase(),
            region,
        })
    }

    /// Pick the highest-priority locale from an `Accept-Language` header.
    ///
    /// Entries are ordered by their `q` weight (default 1.0), ties keep header
    /// order. Entries with `q=0` or an unparseable tag are skipped.
    #[must_use]
    pub fn preferred_from_accept_language(header: &str) -> Option<Self> {
        let mut best: Option<(f32, Self)> = None;

        for entry in header.split(',') {
            let mut pieces = entry.split(';');
            let Some(locale) = pieces.next().and_then(Self::parse) else {
                continue;
            };

            let weight = pieces
                .find_map(|p| p.trim().strip_prefix("q="))
                .and_then(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);

            if weight <= 0.0 {
                continue;
            }

            if best.as_ref().is_none_or(|(w, _)| weight > *w) {
                best = Some((weight, locale));
            }
        }

        best.map(|(_, locale)| locale)
    }

    /// Lower-case primary language subtag (`pl`).
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Upper-case region subtag (`PL`), if any.
    #[must_use]
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// Canonical tag, e.g. `pl-PL` or `de`.
    #[must_use]
    pub fn tag(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.region {
            Some(region) => write!(f, "{}-{region}", self.language),
            None => f.write_str(&self.language),
        }
    }
}

/// Default currency for an ISO 3166-1 alpha-2 region code.
///
/// Covers the markets the storefront ships to; anything else returns `None`
/// and resolution falls through to the shop's base currency.
#[must_use]
pub fn currency_for_region(region: &str) -> Option<&'static str> {
    let code = match region.to_ascii_uppercase().as_str() {
        "US" | "PR" | "EC" => "USD",
        "PL" => "PLN",
        "GB" | "IM" | "JE" | "GG" => "GBP",
        "CA" => "CAD",
        "AU" => "AUD",
        "NZ" => "NZD",
        "JP" => "JPY",
        "CH" | "LI" => "CHF",
        "CZ" => "CZK",
        "SE" => "SEK",
        "NO" => "NOK",
        "DK" => "DKK",
        "AT" | "BE" | "CY" | "DE" | "EE" | "ES" | "FI" | "FR" | "GR" | "HR" | "IE" | "IT"
        | "LT" | "LU" | "LV" | "MT" | "NL" | "PT" | "SI" | "SK" => "EUR",
        _ => return None,
    };
    Some(code)
}
