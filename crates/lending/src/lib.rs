//! `libris-lending`: the borrow/return workflow.
//!
//! [`LendingService`] is the single owner of the catalog and the ledger. It
//! prices a loan, charges the account, reserves a copy, and undoes the charge
//! if the reservation fails, so a caller sees either the whole borrow or none
//! of it.

pub mod clock;
pub mod config;
pub mod content;
pub mod pricing;
pub mod receipt;
pub mod service;
pub mod snapshot;
pub mod stats;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, LendingConfig};
pub use content::{ContentDelivery, ContentGrant};
pub use pricing::{PerDiemPricing, PricingPolicy};
pub use receipt::{BorrowedItem, LoanReceipt};
pub use service::LendingService;
pub use snapshot::{AccountRecord, ItemRecord, LibrarySnapshot, SnapshotError};
pub use stats::CatalogStats;
