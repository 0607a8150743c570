//! Content delivery port.
//!
//! The core never serves files. It decides whether an account is entitled to
//! an item right now and, if so, hands a [`ContentGrant`] to whatever
//! delivers the content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use libris_core::{AccountId, ItemId};

/// Proof that `account_id` currently holds a loan on `item_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentGrant {
    pub item_id: ItemId,
    pub account_id: AccountId,
    /// Opaque reference from the item's metadata.
    pub content_ref: String,
    pub title: String,
    /// End of the loan.
    pub valid_until: DateTime<Utc>,
}

/// Delivers an item's content once the core has granted access.
///
/// `Output` is whatever the collaborator produces (a download URL, a stream
/// handle, its own `Result`); the core passes it through untouched.
pub trait ContentDelivery {
    type Output;

    fn deliver(&self, grant: &ContentGrant) -> Self::Output;
}
