//! `libris-core`: shared building blocks for the lending domain.
//!
//! Identifiers, money and the domain error model. No storage, no IO.

pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod value_object;

pub use entity::Entity;
pub use error::{LendingError, LendingResult};
pub use id::{AccountId, ItemId};
pub use money::Money;
pub use value_object::ValueObject;
