//! Loading and saving the wishlist in the browser session.

use tower_sessions::Session;
use tracing::warn;

use super::{PersistError, WishlistCollection, persist};
use crate::models::session_keys;

/// Load the session's wishlist collection.
///
/// Missing, unreadable, or corrupt data yields an empty collection.
pub async fn load(session: &Session) -> WishlistCollection {
    match session.get::<serde_json::Value>(session_keys::WISHLIST).await {
        Ok(Some(value)) => persist::decode_or_empty(value),
        Ok(None) => WishlistCollection::default(),
        Err(e) => {
            warn!(error = %e, "Failed to read wishlist from session");
            WishlistCollection::default()
        }
    }
}

/// Save the collection to the session in the current envelope.
///
/// # Errors
///
/// Returns an error if encoding or the session store fails.
pub async fn save(session: &Session, collection: &WishlistCollection) -> Result<(), PersistError> {
    let value = persist::encode(collection)?;
    session.insert(session_keys::WISHLIST, value).await?;
    Ok(())
}
