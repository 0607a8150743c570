//! Point-in-time export/import of the whole lending state.
//!
//! Items are keyed by id with their copy counts and active loans; accounts are
//! keyed by id with their balance and role. Importing re-checks every invariant
//! and inserts nothing unless the whole snapshot is valid.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use libris_auth::Role;
use libris_catalog::{Item, ItemMetadata, ItemQuery, Loan};
use libris_core::{AccountId, ItemId, LendingError, Money};
use libris_events::{EventBus, LendingEvent};
use libris_ledger::{Account, AccountProfile};

use crate::clock::Clock;
use crate::pricing::PricingPolicy;
use crate::service::LendingService;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot violates an invariant: {0}")]
    Invariant(#[from] LendingError),

    #[error("loan on item {item_id} references unknown account {account_id}")]
    DanglingLoan { item_id: ItemId, account_id: AccountId },

    #[error("cannot load a snapshot into a service that already holds state")]
    NotEmpty,

    #[error("snapshot encoding: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub metadata: ItemMetadata,
    pub base_price: Money,
    pub total_copies: u32,
    pub copies_available: u32,
    pub active_loans: Vec<Loan>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub balance: Money,
    pub role: Role,
    #[serde(default)]
    pub profile: AccountProfile,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibrarySnapshot {
    pub items: BTreeMap<ItemId, ItemRecord>,
    pub accounts: BTreeMap<AccountId, AccountRecord>,
}

impl LibrarySnapshot {
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl<P, C, B> LendingService<P, C, B>
where
    P: PricingPolicy,
    C: Clock,
    B: EventBus<LendingEvent>,
{
    /// Capture the current state.
    ///
    /// Each entity is read under its own lock; the snapshot is consistent per
    /// entity, not across entities, if mutations run concurrently.
    pub fn snapshot(&self) -> LibrarySnapshot {
        let items = self
            .catalog()
            .find(ItemQuery::all())
            .map(|view| {
                (
                    view.id,
                    ItemRecord {
                        metadata: view.metadata,
                        base_price: view.base_price,
                        total_copies: view.total_copies,
                        copies_available: view.copies_available,
                        active_loans: view.active_loans,
                    },
                )
            })
            .collect();
        let accounts = self
            .ledger()
            .accounts()
            .into_iter()
            .map(|view| {
                (
                    view.id,
                    AccountRecord {
                        balance: view.balance,
                        role: view.role,
                        profile: view.profile,
                    },
                )
            })
            .collect();
        LibrarySnapshot { items, accounts }
    }

    /// Populate an empty service from `snapshot`.
    pub fn load_snapshot(&self, snapshot: LibrarySnapshot) -> Result<(), SnapshotError> {
        if !self.catalog().is_empty() || !self.ledger().is_empty() {
            return Err(SnapshotError::NotEmpty);
        }

        let accounts = snapshot
            .accounts
            .iter()
            .map(|(id, record)| {
                Account::open(*id, record.role, record.balance)
                    .map(|account| account.with_profile(record.profile.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut items = Vec::with_capacity(snapshot.items.len());
        for (id, record) in snapshot.items {
            if let Some(loan) = record
                .active_loans
                .iter()
                .find(|loan| !snapshot.accounts.contains_key(&loan.account_id))
            {
                return Err(SnapshotError::DanglingLoan {
                    item_id: id,
                    account_id: loan.account_id,
                });
            }
            items.push(Item::from_parts(
                id,
                record.metadata,
                record.base_price,
                record.total_copies,
                record.copies_available,
                record.active_loans,
            )?);
        }

        let (item_count, account_count) = (items.len(), accounts.len());
        for account in accounts {
            self.ledger().insert(account)?;
        }
        for item in items {
            self.catalog().insert(item)?;
        }
        tracing::info!(items = item_count, accounts = account_count, "snapshot loaded");
        Ok(())
    }
}
