use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use libris_catalog::ItemView;
use libris_core::{AccountId, ItemId, Money};

/// Returned by a successful borrow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanReceipt {
    pub item_id: ItemId,
    pub account_id: AccountId,
    pub price: Money,
    pub borrowed_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    /// Balance right after the charge.
    pub balance_after: Money,
}

/// One entry of an account's "borrowed items" view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowedItem {
    pub item: ItemView,
    pub due_at: DateTime<Utc>,
    pub overdue: bool,
}
