//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types. IDs are opaque
//! strings: either backend identifiers (`gid://shopify/Product/1`) or local
//! identifiers generated before the backend knows about the entity.

/// Prefix carried by identifiers generated locally.
pub const LOCAL_ID_PREFIX: &str = "local-";

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - `new()`, `generate_local()`, `as_str()`, `is_local()`
/// - `Display`, `From<String>`, `From<&str>` and `AsRef<str>`
///
/// # Example
///
/// ```rust
/// # use harbor_core::define_id;
/// define_id!(ListId);
/// define_id!(EntryId);
///
/// let list = ListId::generate_local();
/// assert!(list.is_local());
///
/// // These are different types, so this won't compile:
/// // let _: ListId = EntryId::new("x");
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing identifier.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generate a fresh local identifier (`local-<uuid v4>`).
            #[must_use]
            pub fn generate_local() -> Self {
                Self(format!(
                    "{}{}",
                    $crate::types::id::LOCAL_ID_PREFIX,
                    ::uuid::Uuid::new_v4()
                ))
            }

            /// Get the underlying string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Whether this identifier was generated locally.
            #[must_use]
            pub fn is_local(&self) -> bool {
                self.0.starts_with($crate::types::id::LOCAL_ID_PREFIX)
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Define standard entity IDs
define_id!(WishlistId);
define_id!(WishlistItemId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_local_and_unique() {
        let a = WishlistId::generate_local();
        let b = WishlistId::generate_local();
        assert!(a.is_local());
        assert_ne!(a, b);
    }

    #[test]
    fn test_backend_ids_are_not_local() {
        let id = WishlistItemId::new("gid://shop/WishlistItem/12");
        assert!(!id.is_local());
        assert_eq!(id.to_string(), "gid://shop/WishlistItem/12");
    }
}
