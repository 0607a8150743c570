use thiserror::Error;

use libris_core::LendingError;

use crate::{Permission, Principal};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: role '{role}' lacks permission '{permission}'")]
    Forbidden {
        role: &'static str,
        permission: Permission,
    },
}

impl From<AuthzError> for LendingError {
    fn from(value: AuthzError) -> Self {
        match value {
            AuthzError::Forbidden { role, permission } => {
                LendingError::forbidden(format!("role '{role}' lacks permission '{permission}'"))
            }
        }
    }
}

/// Authorize a principal for one operation class.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(principal: &Principal, required: Permission) -> Result<(), AuthzError> {
    if principal.role.grants(required) {
        Ok(())
    } else {
        tracing::debug!(
            account_id = %principal.account_id,
            role = %principal.role,
            permission = %required,
            "authorization denied"
        );
        Err(AuthzError::Forbidden {
            role: principal.role.as_str(),
            permission: required,
        })
    }
}
