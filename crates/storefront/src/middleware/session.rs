//! Session middleware configuration.
//!
//! Sessions hold the cart id and the wishlist envelope. They are stored in
//! `PostgreSQL` when a database is configured, in memory otherwise.

use sqlx::PgPool;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "harbor_session";

/// Session expiry time in seconds (30 days).
const SESSION_EXPIRY_SECONDS: i64 = 30 * 24 * 60 * 60;

/// Create the session layer over `store`.
///
/// # Arguments
///
/// * `store` - Session store
/// * `secure` - Whether the cookie carries the `Secure` attribute
#[must_use]
pub fn create_session_layer<S: SessionStore + Clone>(
    store: S,
    secure: bool,
) -> SessionManagerLayer<S> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// In-memory store for single-instance deployments and tests.
#[must_use]
pub fn memory_store() -> MemoryStore {
    MemoryStore::default()
}

/// `PostgreSQL` store, creating the sessions table when missing.
///
/// # Errors
///
/// Returns an error if the migration fails.
pub async fn postgres_store(pool: &PgPool) -> Result<PostgresStore, sqlx::Error> {
    let store = PostgresStore::new(pool.clone());
    store.migrate().await?;
    Ok(store)
}
