//! Optional `PostgreSQL` connection for session storage.
//!
//! The storefront keeps no tables of its own: Shopify owns carts and the
//! wishlist lives in the session. When `STOREFRONT_DATABASE_URL` (or
//! `DATABASE_URL`) is set, sessions are stored in the `tower_sessions`
//! schema, created on startup by the session store's migration.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Create a `PostgreSQL` connection pool.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
