//! Role lifecycle manager.
//!
//! Creates, updates and deletes custom roles against a [`RoleStore`],
//! protecting built-in roles and merging hierarchy-inherited permissions
//! into whatever the caller explicitly requested.

use std::collections::BTreeSet;

use chrono::Utc;
use thiserror::Error;
use tracing::info;

use warden_core::RoleId;

use crate::hierarchy;
use crate::permission::Permission;
use crate::role::{InvalidRoleName, Role, RoleName};
use crate::store::RoleStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoleError {
    #[error(transparent)]
    InvalidName(#[from] InvalidRoleName),

    #[error("permissions cannot be empty")]
    EmptyPermissions,

    #[error("role already exists")]
    DuplicateRole,

    #[error("built-in roles cannot be modified or deleted")]
    BuiltInRoleImmutable,

    #[error("role is assigned to at least one principal")]
    RoleInUse,

    #[error("role not found")]
    RoleNotFound,
}

/// Lifecycle operations over a role store.
///
/// The manager is pure orchestration: every check is synchronous, every
/// failure is surfaced unchanged, and the store call is the only side
/// effect.
pub struct RoleManager<S: RoleStore> {
    store: S,
}

impl<S: RoleStore> RoleManager<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Ensure the seed roles exist. Idempotent: an existing role of the same
    /// name is never duplicated or overwritten.
    pub fn bootstrap(&self) -> Result<(), RoleError> {
        for name in [hierarchy::ROLE_USER, hierarchy::ROLE_ADMIN] {
            if self.store.exists_by_name(name) {
                continue;
            }
            let role = Role::new(
                RoleId::new(),
                RoleName::new(name)?,
                hierarchy::inherited_permissions(name),
                Utc::now(),
            );
            self.store.save(role)?;
            info!(role = name, "seeded built-in role");
        }
        Ok(())
    }

    /// Create a custom role. The stored permission set is the requested set
    /// merged with whatever the hierarchy says the name inherits.
    pub fn create(
        &self,
        name: &str,
        permissions: &BTreeSet<Permission>,
    ) -> Result<Role, RoleError> {
        if self.store.exists_by_name(name) {
            return Err(RoleError::DuplicateRole);
        }
        let name = RoleName::new(name)?;
        if permissions.is_empty() {
            return Err(RoleError::EmptyPermissions);
        }

        let mut merged = hierarchy::inherited_permissions(name.as_str());
        merged.extend(permissions.iter().copied());

        let role = self
            .store
            .save(Role::new(RoleId::new(), name, merged, Utc::now()))?;
        info!(role = %role.name, permissions = role.permissions.len(), "created role");
        Ok(role)
    }

    /// Rename and/or replace the permission set of a custom role.
    ///
    /// Explicit permissions are never removed by inheritance, only
    /// augmented: renaming to a hierarchy name unions in that entry's
    /// inherited set.
    pub fn update(
        &self,
        id: RoleId,
        new_name: &str,
        new_permissions: &BTreeSet<Permission>,
    ) -> Result<Role, RoleError> {
        let existing = self.store.find_by_id(id).ok_or(RoleError::RoleNotFound)?;
        if existing.is_built_in() {
            return Err(RoleError::BuiltInRoleImmutable);
        }
        if existing.name.as_str() != new_name && self.store.exists_by_name(new_name) {
            return Err(RoleError::DuplicateRole);
        }
        let new_name = RoleName::new(new_name)?;
        if new_permissions.is_empty() {
            return Err(RoleError::EmptyPermissions);
        }

        let mut merged = hierarchy::inherited_permissions(new_name.as_str());
        merged.extend(new_permissions.iter().copied());

        let updated = self.store.save(Role {
            id: existing.id,
            name: new_name,
            permissions: merged,
            created_at: existing.created_at,
            updated_at: Utc::now(),
        })?;
        info!(role = %updated.name, "updated role");
        Ok(updated)
    }

    /// Delete a custom role that no principal currently holds.
    pub fn delete(&self, id: RoleId) -> Result<(), RoleError> {
        let role = self.store.find_by_id(id).ok_or(RoleError::RoleNotFound)?;
        if role.is_built_in() {
            return Err(RoleError::BuiltInRoleImmutable);
        }
        if self.store.principals_holding(id) > 0 {
            return Err(RoleError::RoleInUse);
        }
        self.store.delete(id)?;
        info!(role = %role.name, "deleted role");
        Ok(())
    }

    pub fn get(&self, id: RoleId) -> Result<Role, RoleError> {
        self.store.find_by_id(id).ok_or(RoleError::RoleNotFound)
    }

    pub fn find_by_name(&self, name: &str) -> Result<Role, RoleError> {
        self.store.find_by_name(name).ok_or(RoleError::RoleNotFound)
    }

    pub fn all(&self) -> Vec<Role> {
        self.store.all()
    }
}
