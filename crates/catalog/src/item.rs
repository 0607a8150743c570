use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use libris_core::{AccountId, Entity, ItemId, LendingError, LendingResult, Money};

/// Descriptive metadata. Opaque to the lending rules; never validated here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMetadata {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub category: String,
    pub published: Option<NaiveDate>,
    pub description: String,
    pub cover_url: String,
    /// Reference handed to the content delivery collaborator.
    pub content_ref: String,
}

/// Input for adding an item to the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSpec {
    pub metadata: ItemMetadata,
    /// Flat borrowing fee before the per-day component.
    pub base_price: Money,
    pub initial_copies: u32,
}

impl ItemSpec {
    pub fn new(title: impl Into<String>, author: impl Into<String>, base_price: Money, initial_copies: u32) -> Self {
        Self {
            metadata: ItemMetadata {
                title: title.into(),
                author: author.into(),
                ..ItemMetadata::default()
            },
            base_price,
            initial_copies,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.metadata.category = category.into();
        self
    }

    pub fn with_isbn(mut self, isbn: impl Into<String>) -> Self {
        self.metadata.isbn = isbn.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.metadata.description = description.into();
        self
    }

    pub fn with_published(mut self, published: NaiveDate) -> Self {
        self.metadata.published = Some(published);
        self
    }

    pub fn with_content_ref(mut self, content_ref: impl Into<String>) -> Self {
        self.metadata.content_ref = content_ref.into();
        self
    }

    fn validate(&self) -> LendingResult<()> {
        if self.initial_copies < 1 {
            return Err(LendingError::invalid_spec("initial copies must be at least 1"));
        }
        if self.base_price.is_negative() {
            return Err(LendingError::invalid_spec("base price cannot be negative"));
        }
        Ok(())
    }
}

/// An active loan: one account holding one copy until `due_at`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub account_id: AccountId,
    pub due_at: DateTime<Utc>,
}

impl Loan {
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        now > self.due_at
    }
}

/// A lendable catalog entry.
///
/// Invariant: `copies_available + active_loans.len() == total_copies`.
/// Every mutator checks its preconditions before touching state, so a
/// rejected call leaves the item exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    id: ItemId,
    metadata: ItemMetadata,
    base_price: Money,
    total_copies: u32,
    copies_available: u32,
    active_loans: BTreeMap<AccountId, DateTime<Utc>>,
    // Set when the item leaves the catalog; handles still held by in-flight
    // callers must then refuse to lend it.
    removed: bool,
}

impl Item {
    /// Create a fresh item with every copy on the shelf.
    pub fn create(id: ItemId, spec: ItemSpec) -> LendingResult<Self> {
        spec.validate()?;
        Ok(Self {
            id,
            metadata: spec.metadata,
            base_price: spec.base_price,
            total_copies: spec.initial_copies,
            copies_available: spec.initial_copies,
            active_loans: BTreeMap::new(),
            removed: false,
        })
    }

    /// Rebuild an item from stored state, rejecting anything that breaks the
    /// copy-conservation invariant.
    pub fn from_parts(
        id: ItemId,
        metadata: ItemMetadata,
        base_price: Money,
        total_copies: u32,
        copies_available: u32,
        loans: impl IntoIterator<Item = Loan>,
    ) -> LendingResult<Self> {
        if total_copies < 1 {
            return Err(LendingError::invalid_spec("total copies must be at least 1"));
        }
        if base_price.is_negative() {
            return Err(LendingError::invalid_spec("base price cannot be negative"));
        }
        let mut active_loans = BTreeMap::new();
        for loan in loans {
            if active_loans.insert(loan.account_id, loan.due_at).is_some() {
                return Err(LendingError::invalid_spec(format!(
                    "account {} holds two loans on item {id}",
                    loan.account_id
                )));
            }
        }
        if copies_available as usize + active_loans.len() != total_copies as usize {
            return Err(LendingError::invalid_spec(format!(
                "item {id}: {copies_available} available + {} on loan != {total_copies} total",
                active_loans.len()
            )));
        }
        Ok(Self {
            id,
            metadata,
            base_price,
            total_copies,
            copies_available,
            active_loans,
            removed: false,
        })
    }

    pub fn metadata(&self) -> &ItemMetadata {
        &self.metadata
    }

    pub fn base_price(&self) -> Money {
        self.base_price
    }

    pub fn total_copies(&self) -> u32 {
        self.total_copies
    }

    pub fn copies_available(&self) -> u32 {
        self.copies_available
    }

    pub fn is_available(&self) -> bool {
        self.copies_available > 0
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    pub fn has_active_loans(&self) -> bool {
        !self.active_loans.is_empty()
    }

    pub fn loan_of(&self, account_id: AccountId) -> Option<Loan> {
        self.active_loans
            .get(&account_id)
            .map(|due_at| Loan { account_id, due_at: *due_at })
    }

    pub fn loans(&self) -> impl Iterator<Item = Loan> + '_ {
        self.active_loans
            .iter()
            .map(|(account_id, due_at)| Loan { account_id: *account_id, due_at: *due_at })
    }

    /// Lend one copy to `account_id` until `due_at`.
    pub fn reserve(&mut self, account_id: AccountId, due_at: DateTime<Utc>) -> LendingResult<()> {
        if self.removed {
            return Err(LendingError::not_found(format!("item {}", self.id)));
        }
        if self.active_loans.contains_key(&account_id) {
            return Err(LendingError::AlreadyBorrowed);
        }
        if self.copies_available == 0 {
            return Err(LendingError::NoCopiesAvailable);
        }
        self.copies_available -= 1;
        self.active_loans.insert(account_id, due_at);
        Ok(())
    }

    /// Take back the copy lent to `account_id`. Inverse of [`Item::reserve`].
    pub fn release(&mut self, account_id: AccountId) -> LendingResult<Loan> {
        if self.removed {
            return Err(LendingError::not_found(format!("item {}", self.id)));
        }
        let due_at = self
            .active_loans
            .remove(&account_id)
            .ok_or(LendingError::NotBorrowed)?;
        self.copies_available += 1;
        Ok(Loan { account_id, due_at })
    }

    pub fn add_copies(&mut self, count: u32) -> LendingResult<()> {
        if self.removed {
            return Err(LendingError::not_found(format!("item {}", self.id)));
        }
        if count < 1 {
            return Err(LendingError::invalid_spec("must add at least one copy"));
        }
        let total = self
            .total_copies
            .checked_add(count)
            .ok_or_else(|| LendingError::invalid_spec("copy count overflow"))?;
        self.total_copies = total;
        self.copies_available += count;
        Ok(())
    }

    pub(crate) fn mark_removed(&mut self) -> LendingResult<()> {
        if self.has_active_loans() {
            return Err(LendingError::ItemOnLoan);
        }
        self.removed = true;
        Ok(())
    }

    /// Read-only copy of the current state.
    pub fn view(&self) -> ItemView {
        ItemView {
            id: self.id,
            metadata: self.metadata.clone(),
            base_price: self.base_price,
            total_copies: self.total_copies,
            copies_available: self.copies_available,
            active_loans: self.loans().collect(),
        }
    }
}

impl Entity for Item {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Detached snapshot of an item, safe to hand to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemView {
    pub id: ItemId,
    pub metadata: ItemMetadata,
    pub base_price: Money,
    pub total_copies: u32,
    pub copies_available: u32,
    pub active_loans: Vec<Loan>,
}

impl ItemView {
    pub fn available(&self) -> bool {
        self.copies_available > 0
    }

    pub fn loan_of(&self, account_id: AccountId) -> Option<&Loan> {
        self.active_loans.iter().find(|l| l.account_id == account_id)
    }
}
