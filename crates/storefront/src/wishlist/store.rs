//! Wishlist collection and its operations.
//!
//! All operations are infallible; unknown ids are no-ops.

use chrono::{DateTime, Utc};
use harbor_core::{Money, WishlistId, WishlistItemId};
use serde::{Deserialize, Serialize};

/// Name given to the wishlist created on first add.
pub const DEFAULT_WISHLIST_NAME: &str = "My Wishlist";

/// Canonical variant key: blank or whitespace-only ids mean "no variant".
#[must_use]
pub fn normalize_variant_id(variant_id: Option<&str>) -> Option<String> {
    variant_id
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// A saved product (or product variant).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistItem {
    pub id: WishlistItemId,
    pub product_id: String,
    pub variant_id: Option<String>,
    pub title: String,
    pub variant_title: Option<String>,
    pub image_url: Option<String>,
    pub handle: String,
    /// Latest known price.
    pub price: Option<Money>,
    /// Price when the item first entered the list.
    pub price_at_add: Option<Money>,
    pub notify_on_sale: bool,
    pub notify_on_restock: bool,
    pub added_at: DateTime<Utc>,
}

impl WishlistItem {
    fn matches(&self, product_id: &str, variant_id: Option<&str>) -> bool {
        self.product_id == product_id && self.variant_id.as_deref() == variant_id
    }

    /// Whether the current price is below the price when added.
    #[must_use]
    pub fn is_on_sale(&self) -> bool {
        match (&self.price, &self.price_at_add) {
            (Some(now), Some(then)) => {
                now.currency_code == then.currency_code && now.amount < then.amount
            }
            _ => false,
        }
    }

    /// Overwrite display fields and price from `input`.
    fn refresh(&mut self, input: WishlistItemInput) {
        self.title = input.title;
        self.variant_title = input.variant_title;
        self.image_url = input.image_url;
        self.handle = input.handle;
        self.price = input.price;
        self.notify_on_sale = input.notify_on_sale;
        self.notify_on_restock = input.notify_on_restock;
    }
}

/// Data needed to add an item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WishlistItemInput {
    pub product_id: String,
    pub variant_id: Option<String>,
    pub title: String,
    pub variant_title: Option<String>,
    pub image_url: Option<String>,
    pub handle: String,
    pub price: Option<Money>,
    #[serde(default)]
    pub notify_on_sale: bool,
    #[serde(default)]
    pub notify_on_restock: bool,
}

/// A named list of items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wishlist {
    pub id: WishlistId,
    pub name: String,
    pub is_public: bool,
    pub items: Vec<WishlistItem>,
    pub item_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wishlist {
    fn new(name: impl Into<String>, is_public: bool) -> Self {
        let now = Utc::now();
        Self {
            id: WishlistId::generate_local(),
            name: name.into(),
            is_public,
            items: Vec::new(),
            item_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn find_mut(
        &mut self,
        product_id: &str,
        variant_id: Option<&str>,
    ) -> Option<&mut WishlistItem> {
        self.items
            .iter_mut()
            .find(|i| i.matches(product_id, variant_id))
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn sync_count(&mut self) {
        self.item_count = u32::try_from(self.items.len()).unwrap_or(u32::MAX);
    }

    /// Insert or refresh one item, returning its id.
    fn upsert(&mut self, mut input: WishlistItemInput) -> WishlistItemId {
        input.variant_id = normalize_variant_id(input.variant_id.as_deref());

        let product_id = input.product_id.clone();
        let variant_id = input.variant_id.clone();
        let id = match self.find_mut(&product_id, variant_id.as_deref()) {
            Some(item) => {
                item.refresh(input);
                item.id.clone()
            }
            None => {
                let id = WishlistItemId::generate_local();
                let price_at_add = input.price.clone();
                self.items.push(WishlistItem {
                    id: id.clone(),
                    product_id: input.product_id,
                    variant_id: input.variant_id,
                    title: input.title,
                    variant_title: input.variant_title,
                    image_url: input.image_url,
                    handle: input.handle,
                    price: input.price,
                    price_at_add,
                    notify_on_sale: input.notify_on_sale,
                    notify_on_restock: input.notify_on_restock,
                    added_at: Utc::now(),
                });
                self.item_count = self.item_count.saturating_add(1);
                id
            }
        };

        self.touch();
        id
    }

    /// Fold `incoming` items into this list by key.
    fn merge_items(&mut self, incoming: Vec<WishlistItem>) {
        for mut item in incoming {
            let product_id = item.product_id.clone();
            let variant_id = item.variant_id.clone();
            match self.find_mut(&product_id, variant_id.as_deref()) {
                Some(existing) => {
                    let keep_existing_snapshot = existing.added_at <= item.added_at;
                    let (added_at, price_at_add) = if keep_existing_snapshot {
                        (existing.added_at, existing.price_at_add.clone())
                    } else {
                        (item.added_at, item.price_at_add.clone())
                    };
                    *existing = WishlistItem {
                        id: existing.id.clone(),
                        added_at,
                        price_at_add,
                        ..item
                    };
                }
                None => {
                    if self.items.iter().any(|i| i.id == item.id) {
                        item.id = WishlistItemId::generate_local();
                    }
                    self.items.push(item);
                }
            }
        }
        self.sync_count();
    }

    /// Restore invariants on data loaded from storage: one item per key,
    /// unique item ids.
    fn normalize(&mut self) {
        let mut seen: Vec<(String, Option<String>)> = Vec::new();
        let mut ids: Vec<WishlistItemId> = Vec::new();
        self.items.retain_mut(|item| {
            item.variant_id = normalize_variant_id(item.variant_id.as_deref());
            let key = (item.product_id.clone(), item.variant_id.clone());
            if seen.contains(&key) {
                return false;
            }
            seen.push(key);

            if ids.contains(&item.id) {
                item.id = WishlistItemId::generate_local();
            }
            ids.push(item.id.clone());
            true
        });
        self.sync_count();
    }
}

/// All wishlists belonging to one shopper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistCollection {
    pub wishlists: Vec<Wishlist>,
}

impl WishlistCollection {
    /// Empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All wishlists, in creation order.
    #[must_use]
    pub fn wishlists(&self) -> &[Wishlist] {
        &self.wishlists
    }

    /// Look up a wishlist.
    #[must_use]
    pub fn get(&self, id: &WishlistId) -> Option<&Wishlist> {
        self.wishlists.iter().find(|w| &w.id == id)
    }

    fn get_mut(&mut self, id: &WishlistId) -> Option<&mut Wishlist> {
        self.wishlists.iter_mut().find(|w| &w.id == id)
    }

    /// Whether there are no wishlists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.wishlists.is_empty()
    }

    /// Create a new wishlist, returning its id.
    pub fn create_wishlist(&mut self, name: &str, is_public: bool) -> WishlistId {
        let name = match name.trim() {
            "" => DEFAULT_WISHLIST_NAME,
            trimmed => trimmed,
        };
        let wishlist = Wishlist::new(name, is_public);
        let id = wishlist.id.clone();
        self.wishlists.push(wishlist);
        id
    }

    /// Rename a wishlist. Returns `false` for unknown ids or blank names.
    pub fn rename(&mut self, id: &WishlistId, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        match self.get_mut(id) {
            Some(wishlist) => {
                wishlist.name = name.to_string();
                wishlist.touch();
                true
            }
            None => false,
        }
    }

    /// Delete a wishlist and its items. Returns `false` for unknown ids.
    pub fn delete_wishlist(&mut self, id: &WishlistId) -> bool {
        let before = self.wishlists.len();
        self.wishlists.retain(|w| &w.id != id);
        self.wishlists.len() != before
    }

    /// Add (or refresh) an item.
    ///
    /// Targets `wishlist_id` when it exists, otherwise the first wishlist,
    /// creating the default one when the collection is empty.
    pub fn add_item(
        &mut self,
        wishlist_id: Option<&WishlistId>,
        input: WishlistItemInput,
    ) -> WishlistItemId {
        if self.wishlists.is_empty() {
            self.create_wishlist(DEFAULT_WISHLIST_NAME, false);
        }

        let idx = wishlist_id
            .and_then(|id| self.wishlists.iter().position(|w| &w.id == id))
            .unwrap_or(0);

        match self.wishlists.get_mut(idx) {
            Some(wishlist) => wishlist.upsert(input),
            // Unreachable: the collection is non-empty here.
            None => WishlistItemId::generate_local(),
        }
    }

    /// Remove an item. Unknown wishlist or item ids are a no-op.
    ///
    /// Returns whether an item was removed.
    pub fn remove_item(&mut self, wishlist_id: &WishlistId, item_id: &WishlistItemId) -> bool {
        let Some(wishlist) = self.get_mut(wishlist_id) else {
            return false;
        };

        let before = wishlist.items.len();
        wishlist.items.retain(|i| &i.id != item_id);
        if wishlist.items.len() == before {
            return false;
        }

        wishlist.item_count = wishlist.item_count.saturating_sub(1);
        wishlist.touch();
        true
    }

    /// Remove every item from a wishlist.
    pub fn clear(&mut self, wishlist_id: &WishlistId) {
        if let Some(wishlist) = self.get_mut(wishlist_id) {
            wishlist.items.clear();
            wishlist.item_count = 0;
            wishlist.touch();
        }
    }

    /// Whether any wishlist holds this product/variant.
    #[must_use]
    pub fn is_in_wishlist(&self, product_id: &str, variant_id: Option<&str>) -> bool {
        self.find_item(product_id, variant_id).is_some()
    }

    /// First wishlist and item holding this product/variant.
    #[must_use]
    pub fn find_item(
        &self,
        product_id: &str,
        variant_id: Option<&str>,
    ) -> Option<(&Wishlist, &WishlistItem)> {
        let variant_id = normalize_variant_id(variant_id);
        self.wishlists.iter().find_map(|w| {
            w.items
                .iter()
                .find(|i| i.matches(product_id, variant_id.as_deref()))
                .map(|i| (w, i))
        })
    }

    /// Items across all wishlists.
    #[must_use]
    pub fn total_items(&self) -> usize {
        self.wishlists.iter().map(|w| w.items.len()).sum()
    }

    /// Fold another collection into this one.
    ///
    /// Wishlists are matched by id, items by key. For matching items the
    /// incoming display fields and price win; the earliest `added_at` and its
    /// `price_at_add` are kept.
    pub fn merge(&mut self, other: Self) {
        for mut incoming in other.wishlists {
            incoming.normalize();
            match self.get_mut(&incoming.id) {
                Some(existing) => {
                    existing.merge_items(incoming.items);
                    existing.updated_at = existing.updated_at.max(incoming.updated_at);
                }
                None => self.wishlists.push(incoming),
            }
        }
    }

    /// Restore invariants on data loaded from storage.
    pub(crate) fn normalize(&mut self) {
        for wishlist in &mut self.wishlists {
            wishlist.normalize();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::str::FromStr;

    use harbor_core::CurrencyCode;
    use rust_decimal::Decimal;

    use super::*;

    fn usd(amount: &str) -> Money {
        Money::new(
            Decimal::from_str(amount).unwrap(),
            CurrencyCode::parse("USD").unwrap(),
        )
    }

    fn input(product: &str, variant: Option<&str>, price: &str) -> WishlistItemInput {
        WishlistItemInput {
            product_id: product.to_string(),
            variant_id: variant.map(String::from),
            title: format!("Product {product}"),
            handle: product.to_lowercase(),
            price: Some(usd(price)),
            ..Default::default()
        }
    }

    #[test]
    fn test_first_add_creates_default_wishlist() {
        let mut wishlists = WishlistCollection::new();
        wishlists.add_item(None, input("P1", Some("V1"), "10.00"));

        assert_eq!(wishlists.wishlists().len(), 1);
        let list = &wishlists.wishlists()[0];
        assert_eq!(list.name, DEFAULT_WISHLIST_NAME);
        assert!(!list.is_public);
        assert_eq!(list.item_count, 1);
    }

    #[test]
    fn test_add_same_key_refreshes_in_place() {
        let mut wishlists = WishlistCollection::new();
        let first = wishlists.add_item(None, input("P1", Some("V1"), "10.00"));
        let second = wishlists.add_item(None, input("P1", Some("V1"), "8.00"));

        assert_eq!(first, second);
        let list = &wishlists.wishlists()[0];
        assert_eq!(list.items.len(), 1);
        assert_eq!(list.item_count, 1);
        assert_eq!(list.items[0].price, Some(usd("8.00")));
        assert_eq!(list.items[0].price_at_add, Some(usd("10.00")));
        assert!(list.items[0].is_on_sale());
    }

    #[test]
    fn test_blank_variant_matches_absent_variant() {
        let mut wishlists = WishlistCollection::new();
        wishlists.add_item(None, input("P1", None, "10.00"));
        wishlists.add_item(None, input("P1", Some("  "), "12.00"));

        assert_eq!(wishlists.total_items(), 1);
        assert!(wishlists.is_in_wishlist("P1", Some("")));
        assert!(wishlists.is_in_wishlist("P1", None));
    }

    #[test]
    fn test_distinct_variants_are_distinct_items() {
        let mut wishlists = WishlistCollection::new();
        wishlists.add_item(None, input("P1", Some("V1"), "10.00"));
        wishlists.add_item(None, input("P1", Some("V2"), "10.00"));
        wishlists.add_item(None, input("P1", None, "10.00"));

        assert_eq!(wishlists.wishlists()[0].item_count, 3);
        assert!(!wishlists.is_in_wishlist("P1", Some("V3")));
    }

    #[test]
    fn test_add_to_unknown_wishlist_uses_first() {
        let mut wishlists = WishlistCollection::new();
        let first = wishlists.create_wishlist("Gifts", true);
        wishlists.create_wishlist("Later", false);

        wishlists.add_item(
            Some(&WishlistId::new("missing")),
            input("P1", None, "1.00"),
        );
        assert_eq!(wishlists.get(&first).unwrap().item_count, 1);
    }

    #[test]
    fn test_add_to_named_wishlist() {
        let mut wishlists = WishlistCollection::new();
        wishlists.create_wishlist("Gifts", true);
        let later = wishlists.create_wishlist("Later", false);

        wishlists.add_item(Some(&later), input("P1", None, "1.00"));
        let (list, _) = wishlists.find_item("P1", None).unwrap();
        assert_eq!(list.id, later);
    }

    #[test]
    fn test_remove_unknown_item_is_noop() {
        let mut wishlists = WishlistCollection::new();
        wishlists.add_item(None, input("P1", None, "1.00"));
        let id = wishlists.wishlists()[0].id.clone();

        assert!(!wishlists.remove_item(&id, &WishlistItemId::new("nonexistent")));
        assert_eq!(wishlists.get(&id).unwrap().item_count, 1);

        assert!(!wishlists.remove_item(
            &WishlistId::new("nonexistent"),
            &WishlistItemId::new("nonexistent")
        ));
    }

    #[test]
    fn test_remove_item() {
        let mut wishlists = WishlistCollection::new();
        let item = wishlists.add_item(None, input("P1", None, "1.00"));
        wishlists.add_item(None, input("P2", None, "1.00"));
        let id = wishlists.wishlists()[0].id.clone();

        assert!(wishlists.remove_item(&id, &item));
        let list = wishlists.get(&id).unwrap();
        assert_eq!(list.item_count, 1);
        assert!(!wishlists.is_in_wishlist("P1", None));
    }

    #[test]
    fn test_remove_count_floor_at_zero() {
        let mut wishlists = WishlistCollection::new();
        let item = wishlists.add_item(None, input("P1", None, "1.00"));
        let id = wishlists.wishlists()[0].id.clone();
        wishlists.wishlists[0].item_count = 0;

        assert!(wishlists.remove_item(&id, &item));
        assert_eq!(wishlists.get(&id).unwrap().item_count, 0);
    }

    #[test]
    fn test_clear() {
        let mut wishlists = WishlistCollection::new();
        wishlists.add_item(None, input("P1", None, "1.00"));
        wishlists.add_item(None, input("P2", None, "1.00"));
        let id = wishlists.wishlists()[0].id.clone();

        wishlists.clear(&id);
        assert_eq!(wishlists.total_items(), 0);
        assert_eq!(wishlists.get(&id).unwrap().item_count, 0);

        wishlists.clear(&WishlistId::new("missing"));
    }

    #[test]
    fn test_rename_and_delete() {
        let mut wishlists = WishlistCollection::new();
        let id = wishlists.create_wishlist("  ", false);
        assert_eq!(wishlists.get(&id).unwrap().name, DEFAULT_WISHLIST_NAME);

        assert!(wishlists.rename(&id, "Birthday"));
        assert!(!wishlists.rename(&id, ""));
        assert_eq!(wishlists.get(&id).unwrap().name, "Birthday");

        assert!(wishlists.delete_wishlist(&id));
        assert!(!wishlists.delete_wishlist(&id));
        assert!(wishlists.is_empty());
    }

    #[test]
    fn test_merge_keeps_earliest_snapshot() {
        let mut ours = WishlistCollection::new();
        ours.add_item(None, input("P1", Some("V1"), "10.00"));
        let shared_id = ours.wishlists()[0].id.clone();

        let mut theirs = ours.clone();
        let their_item = &mut theirs.wishlists[0].items[0];
        their_item.price = Some(usd("7.50"));
        their_item.price_at_add = Some(usd("9.00"));
        their_item.added_at += chrono::Duration::days(1);
        let mut other = theirs.wishlists[0].items[0].clone();
        other.product_id = "P2".to_string();
        theirs.wishlists[0].items.push(other);

        ours.merge(theirs);

        let list = ours.get(&shared_id).unwrap();
        assert_eq!(list.item_count, 2);
        let p1 = &list.items[0];
        assert_eq!(p1.price, Some(usd("7.50")));
        assert_eq!(p1.price_at_add, Some(usd("10.00")));
    }

    #[test]
    fn test_merge_reissues_colliding_item_ids() {
        let mut ours = WishlistCollection::new();
        let p1 = ours.add_item(None, input("P1", None, "10.00"));
        let list_id = ours.wishlists()[0].id.clone();

        let mut theirs = ours.clone();
        theirs.wishlists[0].items[0].product_id = "P2".to_string();
        ours.merge(theirs);

        let list = ours.get(&list_id).unwrap();
        assert_eq!(list.items.len(), 2);
        assert_ne!(list.items[0].id, list.items[1].id);
        assert_eq!(list.items[0].id, p1);

        assert!(ours.remove_item(&list_id, &p1));
        let list = ours.get(&list_id).unwrap();
        assert_eq!(list.items.len(), 1);
        assert_eq!(list.item_count, 1);
        assert!(ours.is_in_wishlist("P2", None));
    }

    #[test]
    fn test_normalize_reissues_duplicate_ids() {
        let mut ours = WishlistCollection::new();
        ours.add_item(None, input("P1", None, "1.00"));
        let mut copy = ours.wishlists[0].items[0].clone();
        copy.product_id = "P2".to_string();
        ours.wishlists[0].items.push(copy);

        ours.normalize();
        let list = &ours.wishlists()[0];
        assert_eq!(list.item_count, 2);
        assert_ne!(list.items[0].id, list.items[1].id);
    }

    #[test]
    fn test_merge_appends_unknown_wishlists() {
        let mut ours = WishlistCollection::new();
        ours.add_item(None, input("P1", None, "1.00"));

        let mut theirs = WishlistCollection::new();
        theirs.add_item(None, input("P2", None, "1.00"));

        ours.merge(theirs);
        assert_eq!(ours.wishlists().len(), 2);
        assert_eq!(ours.total_items(), 2);
    }
}
