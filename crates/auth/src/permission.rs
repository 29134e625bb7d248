use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use warden_core::ValueObject;

/// Fine-grained capability token.
///
/// The catalog is closed and versioned with the crate: permissions are never
/// created or destroyed at runtime. The serialized form is the token string
/// (e.g. `"user:read"`), which is also the form principals carry in their
/// authority set.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "user:read")]
    UserRead,
    #[serde(rename = "user:create")]
    UserCreate,
    #[serde(rename = "user:update")]
    UserUpdate,
    #[serde(rename = "user:delete")]
    UserDelete,
    #[serde(rename = "role:read")]
    RoleRead,
    #[serde(rename = "role:create")]
    RoleCreate,
    #[serde(rename = "role:update")]
    RoleUpdate,
    #[serde(rename = "role:delete")]
    RoleDelete,
    #[serde(rename = "admin:access")]
    AdminAccess,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown permission token '{0}'")]
pub struct UnknownPermission(pub String);

impl Permission {
    /// Every permission in the catalog, in `Ord` order.
    pub const CATALOG: [Permission; 9] = [
        Permission::UserRead,
        Permission::UserCreate,
        Permission::UserUpdate,
        Permission::UserDelete,
        Permission::RoleRead,
        Permission::RoleCreate,
        Permission::RoleUpdate,
        Permission::RoleDelete,
        Permission::AdminAccess,
    ];

    pub fn as_token(&self) -> &'static str {
        match self {
            Permission::UserRead => "user:read",
            Permission::UserCreate => "user:create",
            Permission::UserUpdate => "user:update",
            Permission::UserDelete => "user:delete",
            Permission::RoleRead => "role:read",
            Permission::RoleCreate => "role:create",
            Permission::RoleUpdate => "role:update",
            Permission::RoleDelete => "role:delete",
            Permission::AdminAccess => "admin:access",
        }
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_token())
    }
}

impl FromStr for Permission {
    type Err = UnknownPermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::CATALOG
            .iter()
            .copied()
            .find(|p| p.as_token() == s)
            .ok_or_else(|| UnknownPermission(s.to_string()))
    }
}

impl ValueObject for Permission {}
