//! Catalog-wide figures for the administrator dashboard.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use libris_catalog::ItemView;
use libris_core::Money;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogStats {
    pub titles: usize,
    pub total_copies: u64,
    pub copies_available: u64,
    pub active_loans: usize,
    pub distinct_borrowers: usize,
    /// Loans whose due time has passed (tracked only; nothing is enforced).
    pub overdue_loans: usize,
    /// Sum of `base_price * total_copies`, clamped at [`Money::MAX`].
    pub inventory_value: Money,
}

impl CatalogStats {
    pub fn compute(items: impl IntoIterator<Item = ItemView>, now: DateTime<Utc>) -> Self {
        let mut stats = CatalogStats::default();
        let mut borrowers = HashSet::new();

        for item in items {
            stats.titles += 1;
            stats.total_copies += u64::from(item.total_copies);
            stats.copies_available += u64::from(item.copies_available);
            stats.inventory_value = stats
                .inventory_value
                .saturating_add(item.base_price.saturating_mul(item.total_copies));
            for loan in &item.active_loans {
                stats.active_loans += 1;
                borrowers.insert(loan.account_id);
                if loan.is_overdue(now) {
                    stats.overdue_loans += 1;
                }
            }
        }

        stats.distinct_borrowers = borrowers.len();
        stats
    }
}
