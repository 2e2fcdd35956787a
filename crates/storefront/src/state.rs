//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::cart::CartRegistry;
use crate::config::StorefrontConfig;
use crate::currency::ShopCurrencies;
use crate::shopify::StorefrontClient;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the Storefront API client and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: Option<PgPool>,
    storefront: StorefrontClient,
    currencies: Arc<ShopCurrencies>,
    carts: CartRegistry,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `storefront` - Storefront API client
    /// * `currencies` - Shop currency settings, resolved at startup
    /// * `pool` - `PostgreSQL` pool when sessions are database-backed
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        storefront: StorefrontClient,
        currencies: ShopCurrencies,
        pool: Option<PgPool>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                storefront,
                currencies: Arc::new(currencies),
                carts: CartRegistry::new(),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get the database pool, if sessions are database-backed.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    /// Get a reference to the Shopify Storefront API client.
    #[must_use]
    pub fn storefront(&self) -> &StorefrontClient {
        &self.inner.storefront
    }

    /// Shop currency settings.
    #[must_use]
    pub fn currencies(&self) -> Arc<ShopCurrencies> {
        Arc::clone(&self.inner.currencies)
    }

    /// Cart reconciliation trackers.
    #[must_use]
    pub fn carts(&self) -> &CartRegistry {
        &self.inner.carts
    }
}
