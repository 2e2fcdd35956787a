//! Per-request currency state.

use std::sync::Arc;

use harbor_core::{CurrencyCode, Locale};
use thiserror::Error;
use tracing::{debug, warn};

use super::{CurrencyCookie, CurrencySource, Resolution, ShopCurrencies, resolve};

/// Errors changing the active currency.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CurrencyError {
    #[error("unsupported currency: {0}")]
    Unsupported(String),
}

#[derive(Debug, Clone)]
enum State {
    Unresolved,
    Resolved(Resolution),
}

/// Holds the active currency for one request or session.
///
/// Starts unresolved. The first [`resolve`](Self::resolve) reads the cookie
/// and fixes the active currency; later calls return it unchanged. Only
/// [`set_currency`](Self::set_currency) changes it after that.
#[derive(Debug)]
pub struct CurrencyStore<C> {
    shop: Arc<ShopCurrencies>,
    cookie: C,
    state: State,
}

impl<C: CurrencyCookie> CurrencyStore<C> {
    /// Unresolved store over `cookie`.
    pub const fn new(shop: Arc<ShopCurrencies>, cookie: C) -> Self {
        Self {
            shop,
            cookie,
            state: State::Unresolved,
        }
    }

    /// Shop currency settings.
    pub fn shop(&self) -> &ShopCurrencies {
        &self.shop
    }

    /// Whether the active currency has been fixed.
    pub const fn is_resolved(&self) -> bool {
        matches!(self.state, State::Resolved(_))
    }

    /// Active currency, once resolved.
    pub const fn active(&self) -> Option<&CurrencyCode> {
        match &self.state {
            State::Resolved(r) => Some(&r.currency),
            State::Unresolved => None,
        }
    }

    /// Where the active currency came from, once resolved.
    pub const fn source(&self) -> Option<CurrencySource> {
        match &self.state {
            State::Resolved(r) => Some(r.source),
            State::Unresolved => None,
        }
    }

    /// Resolve the active currency.
    ///
    /// On the first call the result is written back to the cookie unless the
    /// cookie already held a valid supported code. Cookie failures are logged
    /// and do not affect the result.
    pub fn resolve(&mut self, locale: Option<&Locale>) -> &CurrencyCode {
        if let State::Unresolved = self.state {
            let saved = self.cookie.read().unwrap_or_else(|e| {
                warn!(error = %e, "Failed to read currency cookie");
                None
            });

            let resolution = resolve(&self.shop, saved.as_deref(), locale);
            debug!(
                currency = %resolution.currency,
                source = ?resolution.source,
                "Resolved active currency"
            );

            if resolution.source != CurrencySource::Cookie
                && let Err(e) = self.cookie.write(&resolution.currency)
            {
                warn!(error = %e, "Failed to persist resolved currency");
            }

            self.state = State::Resolved(resolution);
        }

        match &self.state {
            State::Resolved(r) => &r.currency,
            State::Unresolved => self.shop.base(),
        }
    }

    /// Make `code` the active currency and save it.
    ///
    /// # Errors
    ///
    /// Returns [`CurrencyError::Unsupported`] for malformed or unsupported
    /// codes; the active currency and cookie are left untouched.
    pub fn set_currency(&mut self, code: &str) -> Result<&CurrencyCode, CurrencyError> {
        let Some(currency) = CurrencyCode::parse(code)
            .ok()
            .filter(|c| self.shop.is_supported(c))
        else {
            warn!(code, "Rejected unsupported currency");
            return Err(CurrencyError::Unsupported(code.to_string()));
        };

        if let Err(e) = self.cookie.write(&currency) {
            warn!(error = %e, currency = %currency, "Failed to persist selected currency");
        }

        self.state = State::Resolved(Resolution {
            currency,
            source: CurrencySource::Selected,
        });

        match &self.state {
            State::Resolved(r) => Ok(&r.currency),
            State::Unresolved => Ok(self.shop.base()),
        }
    }

    /// Consume the store, returning the cookie.
    pub fn into_cookie(self) -> C {
        self.cookie
    }
}
