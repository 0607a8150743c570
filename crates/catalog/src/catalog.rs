use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use chrono::{DateTime, Utc};

use libris_core::{AccountId, Entity, ItemId, LendingError, LendingResult};

use crate::item::{Item, ItemSpec, ItemView, Loan};
use crate::query::{Find, ItemQuery};

type ItemHandle = Arc<Mutex<Item>>;

#[derive(Debug)]
struct Slot {
    // Insertion order, used to list items stably.
    seq: u64,
    item: ItemHandle,
}

// Item mutators validate before writing, so state behind a poisoned lock is
// still consistent.
pub(crate) fn lock_item(handle: &Mutex<Item>) -> MutexGuard<'_, Item> {
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owner of every lendable item.
///
/// Each item sits behind its own mutex; the map lock is held only long enough
/// to look up, insert or remove a handle. Operations on different items never
/// contend, operations on the same item are serialized.
#[derive(Debug, Default)]
pub struct ItemCatalog {
    items: RwLock<HashMap<ItemId, Slot>>,
    next_seq: AtomicU64,
}

impl ItemCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, item_id: ItemId) -> LendingResult<ItemHandle> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&item_id)
            .map(|slot| slot.item.clone())
            .ok_or_else(|| LendingError::not_found(format!("item {item_id}")))
    }

    /// Handles in insertion order.
    fn sorted_handles(&self) -> Vec<ItemHandle> {
        let items = self.items.read().unwrap_or_else(PoisonError::into_inner);
        let mut slots: Vec<&Slot> = items.values().collect();
        slots.sort_by_key(|slot| slot.seq);
        slots.into_iter().map(|slot| slot.item.clone()).collect()
    }

    /// Create an item with every copy available.
    pub fn add_item(&self, spec: ItemSpec) -> LendingResult<ItemId> {
        let item_id = ItemId::new();
        let item = Item::create(item_id, spec)?;
        self.insert(item)?;
        Ok(item_id)
    }

    /// Insert a fully-built item (restore path). Fails if the id is taken.
    pub fn insert(&self, item: Item) -> LendingResult<()> {
        let item_id = *item.id();
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        if items.contains_key(&item_id) {
            return Err(LendingError::invalid_spec(format!("item {item_id} already exists")));
        }
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        items.insert(
            item_id,
            Slot {
                seq,
                item: Arc::new(Mutex::new(item)),
            },
        );
        Ok(())
    }

    /// Remove an item that has no active loans.
    pub fn remove_item(&self, item_id: ItemId) -> LendingResult<ItemView> {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        let handle = items
            .get(&item_id)
            .map(|slot| slot.item.clone())
            .ok_or_else(|| LendingError::not_found(format!("item {item_id}")))?;
        let mut item = lock_item(&handle);
        item.mark_removed()?;
        items.remove(&item_id);
        Ok(item.view())
    }

    /// Lend one copy of `item_id` to `account_id` until `due_at`.
    pub fn reserve_copy(
        &self,
        item_id: ItemId,
        account_id: AccountId,
        due_at: DateTime<Utc>,
    ) -> LendingResult<()> {
        let handle = self.handle(item_id)?;
        let mut item = lock_item(&handle);
        item.reserve(account_id, due_at).inspect_err(|err| {
            tracing::debug!(%item_id, %account_id, error = %err, "reserve rejected");
        })
    }

    /// Take back the copy `account_id` holds. Inverse of [`ItemCatalog::reserve_copy`].
    pub fn release_copy(&self, item_id: ItemId, account_id: AccountId) -> LendingResult<Loan> {
        let handle = self.handle(item_id)?;
        let mut item = lock_item(&handle);
        item.release(account_id).inspect_err(|err| {
            tracing::debug!(%item_id, %account_id, error = %err, "release rejected");
        })
    }

    /// Grow an item's pool of copies. Returns the new total.
    pub fn add_copies(&self, item_id: ItemId, count: u32) -> LendingResult<u32> {
        let handle = self.handle(item_id)?;
        let mut item = lock_item(&handle);
        item.add_copies(count)?;
        Ok(item.total_copies())
    }

    pub fn get(&self, item_id: ItemId) -> LendingResult<ItemView> {
        let handle = self.handle(item_id)?;
        let item = lock_item(&handle);
        Ok(item.view())
    }

    /// Read the item under its lock without copying it out.
    pub fn inspect<R>(&self, item_id: ItemId, f: impl FnOnce(&Item) -> R) -> LendingResult<R> {
        let handle = self.handle(item_id)?;
        let item = lock_item(&handle);
        Ok(f(&item))
    }

    /// Lazy, restartable search.
    pub fn find(&self, query: ItemQuery) -> Find {
        Find::new(self.sorted_handles(), query)
    }

    /// Every item whose loan set contains `account_id`, with that loan.
    pub fn loans_of(&self, account_id: AccountId) -> Vec<(ItemView, Loan)> {
        self.find(ItemQuery::all())
            .filter_map(|view| {
                let loan = *view.loan_of(account_id)?;
                Some((view, loan))
            })
            .collect()
    }

    /// Distinct categories, sorted.
    pub fn categories(&self) -> Vec<String> {
        self.find(ItemQuery::all())
            .map(|view| view.metadata.category)
            .filter(|c| !c.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.items.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libris_core::Money;
    use std::thread;

    fn spec(title: &str, author: &str, category: &str, copies: u32) -> ItemSpec {
        ItemSpec::new(title, author, Money::from_cents(999), copies).with_category(category)
    }

    #[test]
    fn add_item_then_get() {
        let catalog = ItemCatalog::new();
        let id = catalog.add_item(spec("1984", "George Orwell", "Science Fiction", 3)).unwrap();
        let view = catalog.get(id).unwrap();
        assert_eq!(view.total_copies, 3);
        assert_eq!(view.copies_available, 3);
        assert!(view.active_loans.is_empty());
    }

    #[test]
    fn add_item_with_zero_copies_fails_and_stores_nothing() {
        let catalog = ItemCatalog::new();
        let err = catalog.add_item(spec("Empty", "Nobody", "", 0)).unwrap_err();
        assert!(matches!(err, LendingError::InvalidSpec(_)));
        assert!(catalog.is_empty());
    }

    #[test]
    fn unknown_item_is_not_found() {
        let catalog = ItemCatalog::new();
        let missing = ItemId::new();
        assert!(matches!(catalog.get(missing), Err(LendingError::NotFound(_))));
        assert!(matches!(
            catalog.reserve_copy(missing, AccountId::new(), Utc::now()),
            Err(LendingError::NotFound(_))
        ));
        assert!(matches!(
            catalog.release_copy(missing, AccountId::new()),
            Err(LendingError::NotFound(_))
        ));
        assert!(matches!(catalog.remove_item(missing), Err(LendingError::NotFound(_))));
    }

    #[test]
    fn remove_is_refused_while_on_loan() {
        let catalog = ItemCatalog::new();
        let id = catalog.add_item(spec("Emma", "Jane Austen", "Romance", 1)).unwrap();
        let reader = AccountId::new();
        catalog.reserve_copy(id, reader, Utc::now()).unwrap();

        assert_eq!(catalog.remove_item(id), Err(LendingError::ItemOnLoan));
        assert_eq!(catalog.len(), 1);

        catalog.release_copy(id, reader).unwrap();
        catalog.remove_item(id).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn stale_handle_cannot_lend_removed_item() {
        let catalog = ItemCatalog::new();
        let id = catalog.add_item(spec("Emma", "Jane Austen", "Romance", 1)).unwrap();
        let handle = catalog.handle(id).unwrap();
        catalog.remove_item(id).unwrap();

        let mut item = lock_item(&handle);
        assert!(matches!(
            item.reserve(AccountId::new(), Utc::now()),
            Err(LendingError::NotFound(_))
        ));
    }

    #[test]
    fn find_is_lazy_and_restartable() {
        let catalog = ItemCatalog::new();
        catalog.add_item(spec("The Hobbit", "J.R.R. Tolkien", "Fantasy", 5)).unwrap();
        let silm = catalog
            .add_item(spec("The Silmarillion", "J.R.R. Tolkien", "Fantasy", 1))
            .unwrap();
        catalog.add_item(spec("Emma", "Jane Austen", "Romance", 1)).unwrap();

        let mut found = catalog.find(ItemQuery::all().text("tolkien"));
        let first_pass: Vec<_> = found.clone().map(|v| v.metadata.title).collect();
        assert_eq!(first_pass, vec!["The Hobbit", "The Silmarillion"]);

        // State changes after the search started are visible when reached.
        assert!(found.next().is_some());
        catalog.reserve_copy(silm, AccountId::new(), Utc::now()).unwrap();
        assert_eq!(found.next().unwrap().copies_available, 0);
        assert!(found.next().is_none());

        found.rewind();
        assert_eq!(found.count(), 2);
    }

    #[test]
    fn loans_of_and_categories() {
        let catalog = ItemCatalog::new();
        let a = catalog.add_item(spec("A", "x", "Fiction", 2)).unwrap();
        let b = catalog.add_item(spec("B", "y", "Fantasy", 2)).unwrap();
        catalog.add_item(spec("C", "z", "Fiction", 2)).unwrap();
        let reader = AccountId::new();
        catalog.reserve_copy(a, reader, Utc::now()).unwrap();
        catalog.reserve_copy(b, reader, Utc::now()).unwrap();

        let held: Vec<ItemId> = catalog.loans_of(reader).into_iter().map(|(v, _)| v.id).collect();
        assert_eq!(held, vec![a, b]);
        assert_eq!(catalog.categories(), vec!["Fantasy", "Fiction"]);
    }

    #[test]
    fn concurrent_reserves_never_oversell() {
        let catalog = Arc::new(ItemCatalog::new());
        let id = catalog.add_item(spec("Rare", "Anon", "", 3)).unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let catalog = catalog.clone();
                thread::spawn(move || catalog.reserve_copy(id, AccountId::new(), Utc::now()).is_ok())
            })
            .collect();
        let granted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(granted, 3);
        let view = catalog.get(id).unwrap();
        assert_eq!(view.copies_available, 0);
        assert_eq!(view.active_loans.len(), 3);
    }
}
