//! Audit events emitted by the lending service.
//!
//! One event per committed mutation. `Charged` (borrow payment) and
//! `Withdrawn` (member cash-out) move the balance the same way but stay
//! distinct kinds so the two can be told apart in an audit trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use libris_core::{AccountId, ItemId, Money};

use crate::Event;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LendingEvent {
    ItemAdded {
        item_id: ItemId,
        title: String,
        copies: u32,
        occurred_at: DateTime<Utc>,
    },
    ItemRemoved {
        item_id: ItemId,
        occurred_at: DateTime<Utc>,
    },
    CopiesAdded {
        item_id: ItemId,
        added: u32,
        total_copies: u32,
        occurred_at: DateTime<Utc>,
    },
    AccountOpened {
        account_id: AccountId,
        opening_balance: Money,
        occurred_at: DateTime<Utc>,
    },
    Deposited {
        account_id: AccountId,
        amount: Money,
        balance: Money,
        occurred_at: DateTime<Utc>,
    },
    Withdrawn {
        account_id: AccountId,
        amount: Money,
        balance: Money,
        occurred_at: DateTime<Utc>,
    },
    Charged {
        account_id: AccountId,
        item_id: ItemId,
        amount: Money,
        balance: Money,
        occurred_at: DateTime<Utc>,
    },
    Refunded {
        account_id: AccountId,
        item_id: ItemId,
        amount: Money,
        balance: Money,
        occurred_at: DateTime<Utc>,
    },
    LoanOpened {
        item_id: ItemId,
        account_id: AccountId,
        due_at: DateTime<Utc>,
        occurred_at: DateTime<Utc>,
    },
    LoanClosed {
        item_id: ItemId,
        account_id: AccountId,
        occurred_at: DateTime<Utc>,
    },
}

impl Event for LendingEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LendingEvent::ItemAdded { .. } => "catalog.item.added",
            LendingEvent::ItemRemoved { .. } => "catalog.item.removed",
            LendingEvent::CopiesAdded { .. } => "catalog.item.copies_added",
            LendingEvent::AccountOpened { .. } => "ledger.account.opened",
            LendingEvent::Deposited { .. } => "ledger.account.deposited",
            LendingEvent::Withdrawn { .. } => "ledger.account.withdrawn",
            LendingEvent::Charged { .. } => "ledger.account.charged",
            LendingEvent::Refunded { .. } => "ledger.account.refunded",
            LendingEvent::LoanOpened { .. } => "lending.loan.opened",
            LendingEvent::LoanClosed { .. } => "lending.loan.closed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            LendingEvent::ItemAdded { occurred_at, .. }
            | LendingEvent::ItemRemoved { occurred_at, .. }
            | LendingEvent::CopiesAdded { occurred_at, .. }
            | LendingEvent::AccountOpened { occurred_at, .. }
            | LendingEvent::Deposited { occurred_at, .. }
            | LendingEvent::Withdrawn { occurred_at, .. }
            | LendingEvent::Charged { occurred_at, .. }
            | LendingEvent::Refunded { occurred_at, .. }
            | LendingEvent::LoanOpened { occurred_at, .. }
            | LendingEvent::LoanClosed { occurred_at, .. } => *occurred_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charge_and_withdrawal_are_distinct_kinds() {
        let now = Utc::now();
        let account_id = AccountId::new();
        let charged = LendingEvent::Charged {
            account_id,
            item_id: ItemId::new(),
            amount: Money::from_cents(100),
            balance: Money::ZERO,
            occurred_at: now,
        };
        let withdrawn = LendingEvent::Withdrawn {
            account_id,
            amount: Money::from_cents(100),
            balance: Money::ZERO,
            occurred_at: now,
        };
        assert_ne!(charged.event_type(), withdrawn.event_type());
        assert_eq!(charged.occurred_at(), now);
    }

    #[test]
    fn serializes_with_type_tag() {
        let event = LendingEvent::ItemRemoved {
            item_id: ItemId::new(),
            occurred_at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "item_removed");
    }
}
