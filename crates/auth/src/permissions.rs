use serde::{Deserialize, Serialize};

/// Operation classes gated by role.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Add/remove items, add copies.
    ManageCatalog,
    /// Read catalog-wide statistics (admin dashboard).
    ViewCatalogStats,
    Borrow,
    /// Deposit into / withdraw from one's own account.
    ManageOwnFunds,
}

impl Permission {
    pub fn as_str(self) -> &'static str {
        match self {
            Permission::ManageCatalog => "catalog.manage",
            Permission::ViewCatalogStats => "catalog.stats",
            Permission::Borrow => "lending.borrow",
            Permission::ManageOwnFunds => "ledger.own_funds",
        }
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
