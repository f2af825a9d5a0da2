//! Liked products. Local only; nothing here ever reaches the server.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{ids::ProductId, store::LocalStore};

/// A liked product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistItem {
    /// The liked product.
    pub product_id: ProductId,

    /// When it was liked.
    pub added_at: Timestamp,
}

/// The wishlist document kept in local storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedWishlist {
    /// Items in the order they were liked.
    #[serde(default)]
    pub items: Vec<WishlistItem>,
}

/// What [`Wishlist::toggle_item`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WishlistToggle {
    /// The product was not liked and now is.
    Added,

    /// The product was liked and no longer is.
    Removed,
}

/// Liked products, saved after every toggle.
#[derive(Debug)]
pub struct Wishlist<S> {
    store: S,
    items: Vec<WishlistItem>,
}

impl<S: LocalStore<PersistedWishlist>> Wishlist<S> {
    /// Read the wishlist from `store`; an unreadable document starts empty.
    pub fn load(store: S) -> Self {
        let items = match store.load() {
            Ok(document) => document.unwrap_or_default().items,
            Err(error) => {
                warn!(%error, "discarding unreadable wishlist");
                Vec::new()
            }
        };

        Self { store, items }
    }

    /// Add `product` if absent, remove it if present.
    pub fn toggle_item(&mut self, product: ProductId) -> WishlistToggle {
        let before = self.items.len();

        self.items.retain(|item| item.product_id != product);

        let toggle = if self.items.len() == before {
            self.items.push(WishlistItem {
                product_id: product,
                added_at: Timestamp::now(),
            });
            WishlistToggle::Added
        } else {
            WishlistToggle::Removed
        };

        let document = PersistedWishlist {
            items: self.items.clone(),
        };

        if let Err(error) = self.store.save(&document) {
            warn!(%error, "failed to persist wishlist");
        }

        toggle
    }

    /// Whether `product` is liked.
    pub fn contains(&self, product: ProductId) -> bool {
        self.items.iter().any(|item| item.product_id == product)
    }

    /// Items in the order they were liked.
    pub fn items(&self) -> &[WishlistItem] {
        &self.items
    }

    /// Number of liked products.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is liked.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use crate::store::MemoryStore;

    use super::*;

    fn product() -> ProductId {
        ProductId::from_uuid(Uuid::now_v7())
    }

    #[test]
    fn toggling_twice_restores_the_original_set() {
        let mut wishlist = Wishlist::load(MemoryStore::new());
        let shoe = product();

        assert_eq!(wishlist.toggle_item(shoe), WishlistToggle::Added);
        assert!(wishlist.contains(shoe));
        assert_eq!(wishlist.toggle_item(shoe), WishlistToggle::Removed);
        assert!(wishlist.is_empty());
    }

    #[test]
    fn items_keep_insertion_order() {
        let mut wishlist = Wishlist::load(MemoryStore::new());
        let (first, second, third) = (product(), product(), product());

        for shoe in [first, second, third] {
            wishlist.toggle_item(shoe);
        }

        wishlist.toggle_item(second);

        let order: Vec<_> = wishlist.items().iter().map(|item| item.product_id).collect();

        assert_eq!(order, [first, third]);
        assert_eq!(wishlist.len(), 2);
    }

    #[test]
    fn every_toggle_is_persisted() {
        let mut wishlist = Wishlist::load(MemoryStore::new());
        let shoe = product();

        wishlist.toggle_item(shoe);
        wishlist.toggle_item(product());

        assert_eq!(wishlist.store.saves(), 2);
        assert_eq!(
            wishlist.store.value().map(|doc| doc.items.len()),
            Some(2)
        );

        let reloaded = Wishlist::load(wishlist.store.clone());

        assert!(reloaded.contains(shoe));
    }
}
