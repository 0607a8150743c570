//! Item catalog: lendable items, their copies and their active loans.
//!
//! Pure in-memory state with per-item locking; no IO, no money.

pub mod catalog;
pub mod item;
pub mod query;

pub use catalog::ItemCatalog;
pub use item::{Item, ItemMetadata, ItemSpec, ItemView, Loan};
pub use query::{Find, ItemQuery};
