//! Static role hierarchy table.
//!
//! The table is compile-time-fixed and consulted, never stored: whenever a
//! role is created or renamed to one of the recognized names, its permission
//! set is augmented with the inherited permissions computed here.

use std::collections::BTreeSet;

use crate::permission::Permission;

pub const ROLE_USER: &str = "ROLE_USER";
pub const ROLE_MANAGER: &str = "ROLE_MANAGER";
pub const ROLE_ADMIN: &str = "ROLE_ADMIN";

const USER_BASE: &[Permission] = &[Permission::UserRead];

const MANAGER_BASE: &[Permission] = &[
    Permission::UserRead,
    Permission::UserUpdate,
    Permission::RoleRead,
];

const ADMIN_BASE: &[Permission] = &[
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

const ENTRIES: &[(&str, &[Permission])] = &[
    (ROLE_USER, USER_BASE),
    (ROLE_MANAGER, MANAGER_BASE),
    (ROLE_ADMIN, ADMIN_BASE),
];

/// Base permission set of a hierarchy entry, `None` for unrecognized names.
pub fn base_permissions(role_name: &str) -> Option<&'static [Permission]> {
    ENTRIES
        .iter()
        .find(|(name, _)| *name == role_name)
        .map(|(_, perms)| *perms)
}

/// Total predicate: does `role_name` match a hierarchy entry?
///
/// Built-in roles are immutable and undeletable through the lifecycle
/// manager.
pub fn is_built_in(role_name: &str) -> bool {
    ENTRIES.iter().any(|(name, _)| *name == role_name)
}

/// The fixed subsumption relation: does `role_name` inherit `other`'s base
/// permissions?
///
/// Every entry subsumes itself, `ROLE_ADMIN` subsumes every entry, and
/// `ROLE_MANAGER` subsumes `ROLE_USER`. Names outside the table subsume
/// nothing but themselves.
pub fn subsumes(role_name: &str, other: &str) -> bool {
    if role_name == other {
        return true;
    }
    if role_name == ROLE_ADMIN {
        return true;
    }
    role_name == ROLE_MANAGER && other == ROLE_USER
}

/// Union of the base permission sets of every entry `role_name` subsumes.
///
/// Returns the empty set for names that match no entry: custom roles inherit
/// nothing automatically.
pub fn inherited_permissions(role_name: &str) -> BTreeSet<Permission> {
    let mut permissions = BTreeSet::new();
    for (name, base) in ENTRIES.iter().copied() {
        if subsumes(role_name, name) {
            permissions.extend(base.iter().copied());
        }
    }
    permissions
}
