use serde::{Deserialize, Serialize};

use crate::Permission;

/// Role of an account holder.
///
/// Closed on purpose: the lending core only ever distinguishes these two.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Administrator,
    Member,
}

impl Role {
    /// Permissions granted to this role.
    pub fn permissions(self) -> &'static [Permission] {
        match self {
            Role::Administrator => &[
                Permission::ManageCatalog,
                Permission::ViewCatalogStats,
                Permission::Borrow,
                Permission::ManageOwnFunds,
            ],
            Role::Member => &[Permission::Borrow, Permission::ManageOwnFunds],
        }
    }

    pub fn grants(self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Administrator => "administrator",
            Role::Member => "member",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn members_cannot_manage_catalog() {
        assert!(!Role::Member.grants(Permission::ManageCatalog));
        assert!(Role::Member.grants(Permission::Borrow));
        assert!(Role::Administrator.grants(Permission::ManageCatalog));
    }

    #[test]
    fn serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&Role::Administrator).unwrap(),
            "\"administrator\""
        );
    }
}
