//! Collaborator ports.
//!
//! The core never talks to a database or a session layer directly; it calls
//! these traits. Each method is an atomic operation from the core's point of
//! view — transaction semantics belong to the implementation, and a
//! uniqueness race inside `save` surfaces as [`RoleError::DuplicateRole`].

use std::sync::Arc;

use warden_core::{PrincipalId, RoleId};

use crate::lifecycle::RoleError;
use crate::principal::Principal;
use crate::role::Role;

/// Storage port for roles and the role ↔ principal association.
///
/// Implementations must serialize create/update/delete for the same role
/// name; operations on distinct names may proceed in parallel.
pub trait RoleStore {
    fn find_by_id(&self, id: RoleId) -> Option<Role>;

    fn find_by_name(&self, name: &str) -> Option<Role>;

    fn exists_by_name(&self, name: &str) -> bool;

    /// Insert or replace the role. Must fail with
    /// [`RoleError::DuplicateRole`] if another role already owns the name.
    fn save(&self, role: Role) -> Result<Role, RoleError>;

    fn delete(&self, id: RoleId) -> Result<(), RoleError>;

    fn all(&self) -> Vec<Role>;

    /// Number of principals currently holding the role.
    fn principals_holding(&self, id: RoleId) -> usize;
}

/// Read port producing a principal snapshot valid for one decision.
pub trait PrincipalSource {
    fn load(&self, id: PrincipalId) -> Option<Principal>;
}

impl<S: RoleStore + ?Sized> RoleStore for Arc<S> {
    fn find_by_id(&self, id: RoleId) -> Option<Role> {
        (**self).find_by_id(id)
    }

    fn find_by_name(&self, name: &str) -> Option<Role> {
        (**self).find_by_name(name)
    }

    fn exists_by_name(&self, name: &str) -> bool {
        (**self).exists_by_name(name)
    }

    fn save(&self, role: Role) -> Result<Role, RoleError> {
        (**self).save(role)
    }

    fn delete(&self, id: RoleId) -> Result<(), RoleError> {
        (**self).delete(id)
    }

    fn all(&self) -> Vec<Role> {
        (**self).all()
    }

    fn principals_holding(&self, id: RoleId) -> usize {
        (**self).principals_holding(id)
    }
}

impl<S: PrincipalSource + ?Sized> PrincipalSource for Arc<S> {
    fn load(&self, id: PrincipalId) -> Option<Principal> {
        (**self).load(id)
    }
}
