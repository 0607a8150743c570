//! Catalog search.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::catalog::lock_item;
use crate::item::{Item, ItemView};

/// Search predicate over title, author and category.
///
/// `text` matches title OR author as a case-insensitive substring.
/// `category` must match exactly; `None` means every category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemQuery {
    pub text: Option<String>,
    pub category: Option<String>,
}

impl ItemQuery {
    /// Matches everything.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.text = if text.trim().is_empty() { None } else { Some(text) };
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn matches(&self, item: &Item) -> bool {
        let meta = item.metadata();
        let text_ok = match &self.text {
            None => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                meta.title.to_lowercase().contains(&needle)
                    || meta.author.to_lowercase().contains(&needle)
            }
        };
        let category_ok = match &self.category {
            None => true,
            Some(category) => meta.category == *category,
        };
        text_ok && category_ok
    }
}

/// Lazy search over the catalog.
///
/// Holds the item handles that existed when the search started and inspects
/// each one only when the iterator reaches it, so it always yields each
/// item's current state. Items removed in the meantime are skipped. Clone it
/// to restart from the beginning.
#[derive(Debug, Clone)]
pub struct Find {
    handles: Arc<[Arc<Mutex<Item>>]>,
    query: ItemQuery,
    pos: usize,
}

impl Find {
    pub(crate) fn new(handles: Vec<Arc<Mutex<Item>>>, query: ItemQuery) -> Self {
        Self {
            handles: handles.into(),
            query,
            pos: 0,
        }
    }

    /// Start over from the first item.
    pub fn rewind(&mut self) {
        self.pos = 0;
    }
}

impl Iterator for Find {
    type Item = ItemView;

    fn next(&mut self) -> Option<ItemView> {
        while let Some(handle) = self.handles.get(self.pos) {
            self.pos += 1;
            let item = lock_item(handle);
            if !item.is_removed() && self.query.matches(&item) {
                return Some(item.view());
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.handles.len() - self.pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemSpec;
    use libris_core::{ItemId, Money};

    fn item(title: &str, author: &str, category: &str) -> Item {
        Item::create(
            ItemId::new(),
            ItemSpec::new(title, author, Money::from_cents(999), 1).with_category(category),
        )
        .unwrap()
    }

    #[test]
    fn text_matches_title_or_author_case_insensitively() {
        let gatsby = item("The Great Gatsby", "F. Scott Fitzgerald", "Fiction");
        assert!(ItemQuery::all().text("gatsby").matches(&gatsby));
        assert!(ItemQuery::all().text("FITZ").matches(&gatsby));
        assert!(!ItemQuery::all().text("tolkien").matches(&gatsby));
    }

    #[test]
    fn category_is_exact() {
        let hobbit = item("The Hobbit", "J.R.R. Tolkien", "Fantasy");
        assert!(ItemQuery::all().category("Fantasy").matches(&hobbit));
        assert!(!ItemQuery::all().category("fantasy").matches(&hobbit));
    }

    #[test]
    fn blank_text_matches_everything() {
        let hobbit = item("The Hobbit", "J.R.R. Tolkien", "Fantasy");
        assert_eq!(ItemQuery::all().text("   ").text, None);
        assert!(ItemQuery::all().text("").matches(&hobbit));
    }
}
