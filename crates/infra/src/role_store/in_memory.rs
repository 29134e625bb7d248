use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;
use tracing::debug;

use warden_auth::lifecycle::RoleError;
use warden_auth::principal::{Principal, canonical_subject};
use warden_auth::role::Role;
use warden_auth::store::{PrincipalSource, RoleStore};
use warden_core::{PrincipalId, RoleId};

/// Failures of the role ↔ principal association, which is owned by the
/// store, not by the role or principal objects.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssignmentError {
    #[error("unknown principal")]
    UnknownPrincipal,

    #[error("unknown role")]
    UnknownRole,
}

#[derive(Debug, Default)]
struct State {
    roles: HashMap<RoleId, Role>,
    names: HashMap<String, RoleId>,
    // Two independent index tables; neither Role nor Principal carries a
    // back-pointer to the other.
    role_principals: HashMap<RoleId, HashSet<PrincipalId>>,
    principal_roles: HashMap<PrincipalId, HashSet<RoleId>>,
    subjects: HashMap<PrincipalId, String>,
}

/// In-memory role store and principal directory.
///
/// Intended for tests/dev and single-process deployments. The single lock
/// serializes all lifecycle mutations, which satisfies the per-name
/// serialization contract of [`RoleStore`]; reads share the lock.
#[derive(Debug, Default)]
pub struct InMemoryRoleStore {
    state: RwLock<State>,
}

impl InMemoryRoleStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Writers never panic while holding the guard, so a poisoned lock still
    // protects consistent state; recover it instead of propagating.
    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an identity and return its principal id.
    pub fn register_principal(&self, subject: &str) -> PrincipalId {
        let id = PrincipalId::new();
        let mut state = self.write();
        state.subjects.insert(id, canonical_subject(subject));
        state.principal_roles.insert(id, HashSet::new());
        debug!(principal = %id, "registered principal");
        id
    }

    pub fn assign_role(
        &self,
        principal: PrincipalId,
        role_id: RoleId,
    ) -> Result<(), AssignmentError> {
        let mut state = self.write();
        if !state.subjects.contains_key(&principal) {
            return Err(AssignmentError::UnknownPrincipal);
        }
        if !state.roles.contains_key(&role_id) {
            return Err(AssignmentError::UnknownRole);
        }
        state.role_principals.entry(role_id).or_default().insert(principal);
        state.principal_roles.entry(principal).or_default().insert(role_id);
        Ok(())
    }

    pub fn revoke_role(
        &self,
        principal: PrincipalId,
        role_id: RoleId,
    ) -> Result<(), AssignmentError> {
        let mut state = self.write();
        if !state.subjects.contains_key(&principal) {
            return Err(AssignmentError::UnknownPrincipal);
        }
        if let Some(holders) = state.role_principals.get_mut(&role_id) {
            holders.remove(&principal);
        }
        if let Some(held) = state.principal_roles.get_mut(&principal) {
            held.remove(&role_id);
        }
        Ok(())
    }

    /// Replace a principal's role assignments wholesale.
    pub fn replace_roles(
        &self,
        principal: PrincipalId,
        role_ids: &[RoleId],
    ) -> Result<(), AssignmentError> {
        let mut state = self.write();
        if !state.subjects.contains_key(&principal) {
            return Err(AssignmentError::UnknownPrincipal);
        }
        if role_ids.iter().any(|id| !state.roles.contains_key(id)) {
            return Err(AssignmentError::UnknownRole);
        }

        let previous = state
            .principal_roles
            .insert(principal, role_ids.iter().copied().collect())
            .unwrap_or_default();
        for role_id in previous {
            if let Some(holders) = state.role_principals.get_mut(&role_id) {
                holders.remove(&principal);
            }
        }
        for role_id in role_ids {
            state.role_principals.entry(*role_id).or_default().insert(principal);
        }
        Ok(())
    }
}

impl RoleStore for InMemoryRoleStore {
    fn find_by_id(&self, id: RoleId) -> Option<Role> {
        self.read().roles.get(&id).cloned()
    }

    fn find_by_name(&self, name: &str) -> Option<Role> {
        let state = self.read();
        let id = state.names.get(name)?;
        state.roles.get(id).cloned()
    }

    fn exists_by_name(&self, name: &str) -> bool {
        self.read().names.contains_key(name)
    }

    fn save(&self, role: Role) -> Result<Role, RoleError> {
        let mut state = self.write();

        // Name uniqueness is re-checked under the write lock: a validation
        // done by the manager may be stale by the time we get here.
        if let Some(owner) = state.names.get(role.name.as_str()) {
            if *owner != role.id {
                return Err(RoleError::DuplicateRole);
            }
        }

        let stale_name = state
            .roles
            .get(&role.id)
            .filter(|previous| previous.name != role.name)
            .map(|previous| previous.name.as_str().to_string());
        if let Some(old) = stale_name {
            state.names.remove(&old);
        }
        state.names.insert(role.name.as_str().to_string(), role.id);
        state.roles.insert(role.id, role.clone());
        debug!(role = %role.name, "saved role");
        Ok(role)
    }

    fn delete(&self, id: RoleId) -> Result<(), RoleError> {
        let mut state = self.write();
        let role = state.roles.remove(&id).ok_or(RoleError::RoleNotFound)?;
        state.names.remove(role.name.as_str());

        if let Some(holders) = state.role_principals.remove(&id) {
            for principal in holders {
                if let Some(held) = state.principal_roles.get_mut(&principal) {
                    held.remove(&id);
                }
            }
        }
        debug!(role = %role.name, "deleted role");
        Ok(())
    }

    fn all(&self) -> Vec<Role> {
        let mut roles: Vec<Role> = self.read().roles.values().cloned().collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        roles
    }

    fn principals_holding(&self, id: RoleId) -> usize {
        self.read()
            .role_principals
            .get(&id)
            .map(HashSet::len)
            .unwrap_or(0)
    }
}

impl PrincipalSource for InMemoryRoleStore {
    fn load(&self, id: PrincipalId) -> Option<Principal> {
        let state = self.read();
        let subject = state.subjects.get(&id)?;
        let held: Vec<&Role> = state
            .principal_roles
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|role_id| state.roles.get(role_id))
            .collect();
        Some(Principal::from_roles(id, subject, held))
    }
}
