use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use warden_core::{Entity, RoleId, ValueObject};

use crate::hierarchy;
use crate::permission::Permission;

/// Why a candidate role name was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidRoleName {
    #[error("role name cannot be empty")]
    Empty,

    #[error("role name must start with 'ROLE_'")]
    MissingPrefix,

    #[error("role name too short")]
    TooShort,

    #[error("role name must contain only uppercase letters, numbers, and underscores")]
    BadCharacters,
}

/// Validated role name.
///
/// A `RoleName` always matches `ROLE_[A-Z0-9_]+` and is at least six
/// characters long; construction is the only way to obtain one, so code
/// downstream never re-validates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoleName(String);

impl RoleName {
    pub fn new(name: impl Into<String>) -> Result<Self, InvalidRoleName> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(InvalidRoleName::Empty);
        }
        if !name.starts_with("ROLE_") {
            return Err(InvalidRoleName::MissingPrefix);
        }
        // "ROLE_" plus at least one character.
        if name.len() < 6 {
            return Err(InvalidRoleName::TooShort);
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(InvalidRoleName::BadCharacters);
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Does this name match a role hierarchy entry?
    pub fn is_built_in(&self) -> bool {
        hierarchy::is_built_in(&self.0)
    }
}

impl core::fmt::Display for RoleName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RoleName {
    type Error = InvalidRoleName;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        RoleName::new(value)
    }
}

impl From<RoleName> for String {
    fn from(value: RoleName) -> Self {
        value.0
    }
}

impl ValueObject for RoleName {}

/// A named, mutable bundle of permissions assignable to principals.
///
/// # Invariants
/// - `name` is unique across the store (enforced by the lifecycle manager
///   and surfaced by the store as `DuplicateRole` on races).
/// - `permissions` is non-empty (enforced by the lifecycle manager).
/// - The role carries no back-pointer to principals; the association lives
///   in the store's index tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: RoleName,
    pub permissions: BTreeSet<Permission>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Role {
    pub fn new(
        id: RoleId,
        name: RoleName,
        permissions: BTreeSet<Permission>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            permissions,
            created_at: at,
            updated_at: at,
        }
    }

    pub fn is_built_in(&self) -> bool {
        self.name.is_built_in()
    }
}

impl Entity for Role {
    type Id = RoleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn accepts_well_formed_names() {
        for name in ["ROLE_USER", "ROLE_ADMIN", "ROLE_AUDITOR_2", "ROLE_A"] {
            assert!(RoleName::new(name).is_ok(), "expected '{name}' to be valid");
        }
    }

    #[test]
    fn rejects_lowercase() {
        assert_eq!(
            RoleName::new("role_x").unwrap_err(),
            InvalidRoleName::MissingPrefix
        );
        assert_eq!(
            RoleName::new("ROLE_x").unwrap_err(),
            InvalidRoleName::BadCharacters
        );
    }

    #[test]
    fn rejects_empty_and_short_names() {
        assert_eq!(RoleName::new("").unwrap_err(), InvalidRoleName::Empty);
        assert_eq!(RoleName::new("   ").unwrap_err(), InvalidRoleName::Empty);
        assert_eq!(RoleName::new("ROLE_").unwrap_err(), InvalidRoleName::TooShort);
    }

    #[test]
    fn rejects_missing_prefix() {
        assert_eq!(
            RoleName::new("ADMIN_ROLE").unwrap_err(),
            InvalidRoleName::MissingPrefix
        );
    }

    #[test]
    fn serde_rejects_invalid_names() {
        let err = serde_json::from_str::<RoleName>("\"role_x\"");
        assert!(err.is_err());
        let ok: RoleName = serde_json::from_str("\"ROLE_SUPPORT\"").unwrap();
        assert_eq!(ok.as_str(), "ROLE_SUPPORT");
    }

    proptest! {
        /// Property: every accepted name satisfies the documented shape.
        #[test]
        fn accepted_names_match_the_pattern(name in "\\PC{0,24}") {
            if let Ok(valid) = RoleName::new(name.clone()) {
                let s = valid.as_str();
                prop_assert!(s.starts_with("ROLE_"));
                prop_assert!(s.len() >= 6);
                prop_assert!(s.chars().all(|c| c.is_ascii_uppercase()
                    || c.is_ascii_digit()
                    || c == '_'));
            }
        }

        /// Property: names matching the pattern are always accepted.
        #[test]
        fn pattern_names_are_accepted(suffix in "[A-Z0-9_]{1,20}") {
            let name = format!("ROLE_{suffix}");
            prop_assert!(RoleName::new(name).is_ok());
        }
    }
}
