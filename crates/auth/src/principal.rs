use serde::{Deserialize, Serialize};

use libris_core::AccountId;

use crate::Role;

/// A resolved caller: which account is acting, and in which role.
///
/// Produced by an [`crate::AuthenticationProvider`] before any core call.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    pub account_id: AccountId,
    pub role: Role,
}

impl Principal {
    pub fn new(account_id: AccountId, role: Role) -> Self {
        Self { account_id, role }
    }

    pub fn administrator(account_id: AccountId) -> Self {
        Self::new(account_id, Role::Administrator)
    }

    pub fn member(account_id: AccountId) -> Self {
        Self::new(account_id, Role::Member)
    }

    pub fn is_administrator(&self) -> bool {
        self.role == Role::Administrator
    }
}
