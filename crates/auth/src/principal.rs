use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use warden_core::PrincipalId;

use crate::role::Role;

/// Canonical form of an identity claim.
///
/// Applied once at snapshot construction and again to any invocation
/// argument compared against the subject, so `"  Alice@Example.com "`
/// and `"alice@example.com"` name the same actor.
pub fn canonical_subject(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

/// A fully resolved principal for authorization decisions.
///
/// This is a derived, immutable snapshot: the role names currently held and
/// the union of every held role's permission tokens. Role names and
/// permission tokens share one authority namespace at evaluation time, so a
/// policy can match either through [`Principal::has_authority`].
///
/// Construction is intentionally decoupled from storage and transport; a
/// [`crate::store::PrincipalSource`] produces one snapshot per decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: PrincipalId,
    /// Canonical identity claim (e.g. lowercased email).
    pub subject: String,
    pub roles: BTreeSet<String>,
    pub authorities: BTreeSet<String>,
}

impl Principal {
    /// Derive a snapshot from the roles currently held.
    pub fn from_roles<'a, I>(id: PrincipalId, subject: &str, held: I) -> Self
    where
        I: IntoIterator<Item = &'a Role>,
    {
        let mut roles = BTreeSet::new();
        let mut authorities = BTreeSet::new();
        for role in held {
            roles.insert(role.name.as_str().to_string());
            authorities.insert(role.name.as_str().to_string());
            authorities.extend(role.permissions.iter().map(|p| p.as_token().to_string()));
        }
        Self {
            id,
            subject: canonical_subject(subject),
            roles,
            authorities,
        }
    }

    /// True iff `name` (or its canonical `ROLE_`-prefixed form) is held.
    pub fn has_role(&self, name: &str) -> bool {
        if self.roles.contains(name) {
            return true;
        }
        !name.starts_with("ROLE_") && self.roles.contains(&format!("ROLE_{name}"))
    }

    pub fn has_any_role<'a, I>(&self, names: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        names.into_iter().any(|n| self.has_role(n))
    }

    /// Exact match against the combined role-name + permission-token set.
    pub fn has_authority(&self, token: &str) -> bool {
        self.authorities.contains(token)
    }
}
