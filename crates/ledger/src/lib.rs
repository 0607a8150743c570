//! Account ledger: balances and the four ways they move.
//!
//! Pure in-memory state with per-account locking; no IO.

pub mod account;
pub mod ledger;

pub use account::{Account, AccountProfile, AccountView, EntryKind, JOURNAL_CAPACITY, LedgerEntry};
pub use ledger::AccountLedger;
