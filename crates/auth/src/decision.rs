//! Authorization decision engine.
//!
//! `decide` is a pure, synchronous function over immutable inputs: a policy,
//! an optional principal snapshot, and the invocation arguments. It touches
//! no shared mutable state and is safe to call concurrently without
//! coordination.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

use warden_core::PrincipalId;

use crate::policy::{AuthorityExpr, Policy, Segment};
use crate::principal::{Principal, canonical_subject};

/// Why a decision did not grant.
///
/// `NotAuthenticated` and `InsufficientAuthority` are expected, recoverable
/// conditions. `MissingArgument` is a configuration defect: a policy
/// references an invocation argument the call site never supplied, which
/// should be treated as fatal by the surrounding system.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("not authenticated")]
    NotAuthenticated,

    /// Deliberately carries no detail: a denial never discloses which
    /// predicate failed beyond the authenticated/authorized distinction.
    #[error("access denied")]
    InsufficientAuthority,

    #[error("policy references missing invocation argument '{0}'")]
    MissingArgument(String),
}

/// Named arguments supplied by the invocation context for one call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationArgs(BTreeMap<String, String>);

impl InvocationArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for InvocationArgs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Evaluate `policy` against the current principal and call arguments.
///
/// Argument references are resolved eagerly: every argument the policy *can*
/// touch must be present, even in branches short-circuit evaluation would
/// skip. This keeps the outcome independent of branch order and makes a
/// miswired call site fail loudly instead of granting through a
/// short-circuited disjunction.
pub fn decide(
    policy: &Policy,
    principal: Option<&Principal>,
    args: &InvocationArgs,
) -> Result<(), AccessError> {
    for name in policy.referenced_args() {
        if args.get(&name).is_none() {
            error!(argument = %name, "policy references an argument absent from the invocation context");
            return Err(AccessError::MissingArgument(name));
        }
    }

    if eval(policy, principal, args)? {
        debug!(principal = ?principal.map(|p| p.id), "access granted");
        return Ok(());
    }

    match principal {
        None => {
            debug!("access denied: no authenticated principal");
            Err(AccessError::NotAuthenticated)
        }
        Some(p) => {
            debug!(principal = %p.id, roles = ?p.roles, "access denied: insufficient authority");
            Err(AccessError::InsufficientAuthority)
        }
    }
}

fn eval(
    policy: &Policy,
    principal: Option<&Principal>,
    args: &InvocationArgs,
) -> Result<bool, AccessError> {
    match policy {
        Policy::Anonymous => Ok(true),
        Policy::Authenticated => Ok(principal.is_some()),
        Policy::HasRole(name) => Ok(principal.is_some_and(|p| p.has_role(name))),
        Policy::HasAnyRole(names) => {
            Ok(principal.is_some_and(|p| p.has_any_role(names.iter().map(|n| n.as_ref()))))
        }
        Policy::HasAuthority(expr) => {
            let token = resolve(expr, args)?;
            Ok(principal.is_some_and(|p| p.has_authority(&token)))
        }
        Policy::SelfOrAuthority { authority, arg } => {
            let token = resolve(authority, args)?;
            let value = args
                .get(arg)
                .ok_or_else(|| AccessError::MissingArgument(arg.to_string()))?;
            Ok(principal.is_some_and(|p| {
                p.has_authority(&token) || canonical_subject(value) == p.subject
            }))
        }
        Policy::All(branches) => {
            for branch in branches {
                if !eval(branch, principal, args)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Policy::Any(branches) => {
            for branch in branches {
                if eval(branch, principal, args)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Policy::Not(inner) => Ok(!eval(inner, principal, args)?),
    }
}

fn resolve(expr: &AuthorityExpr, args: &InvocationArgs) -> Result<String, AccessError> {
    let mut token = String::new();
    for segment in expr.segments() {
        match segment {
            Segment::Literal(s) => token.push_str(s),
            Segment::Arg(name) => {
                let value = args
                    .get(name)
                    .ok_or_else(|| AccessError::MissingArgument(name.to_string()))?;
                token.push_str(value);
            }
        }
    }
    Ok(token)
}

// ─────────────────────────────────────────────────────────────────────────────
// Decision Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Detailed explanation of a decision, for audit logging only.
///
/// Never returned to callers on the deny path; `decide` deliberately stays
/// opaque there.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionExplanation {
    pub granted: bool,
    pub reason: String,
    pub principal: Option<PrincipalState>,
    pub denial: Option<DenialKind>,
}

/// Snapshot of the principal's state at decision time.
#[derive(Debug, Clone, Serialize)]
pub struct PrincipalState {
    pub principal_id: PrincipalId,
    pub subject: String,
    pub roles: Vec<String>,
    pub authorities: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    NotAuthenticated,
    InsufficientAuthority,
    MissingArgument,
}

/// Explain why a decision was made (or would be made).
pub fn explain(
    policy: &Policy,
    principal: Option<&Principal>,
    args: &InvocationArgs,
) -> DecisionExplanation {
    let state = principal.map(|p| PrincipalState {
        principal_id: p.id,
        subject: p.subject.clone(),
        roles: p.roles.iter().cloned().collect(),
        authorities: p.authorities.iter().cloned().collect(),
    });

    match decide(policy, principal, args) {
        Ok(()) => DecisionExplanation {
            granted: true,
            reason: "policy evaluated to grant".to_string(),
            principal: state,
            denial: None,
        },
        Err(err) => {
            let (kind, reason) = match &err {
                AccessError::NotAuthenticated => (
                    DenialKind::NotAuthenticated,
                    "no authenticated principal present".to_string(),
                ),
                AccessError::InsufficientAuthority => (
                    DenialKind::InsufficientAuthority,
                    "principal holds none of the required authorities".to_string(),
                ),
                AccessError::MissingArgument(name) => (
                    DenialKind::MissingArgument,
                    format!("invocation argument '{name}' was not supplied"),
                ),
            };
            DecisionExplanation {
                granted: false,
                reason,
                principal: state,
                denial: Some(kind),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy;
    use crate::role::{Role, RoleName};
    use chrono::Utc;
    use warden_core::RoleId;

    fn role(name: &str) -> Role {
        Role::new(
            RoleId::new(),
            RoleName::new(name).unwrap(),
            hierarchy::inherited_permissions(name),
            Utc::now(),
        )
    }

    fn principal(role_names: &[&str]) -> Principal {
        let roles: Vec<Role> = role_names.iter().map(|n| role(n)).collect();
        Principal::from_roles(PrincipalId::new(), "alice@example.com", roles.iter())
    }

    #[test]
    fn anonymous_grants_without_principal() {
        assert!(decide(&Policy::Anonymous, None, &InvocationArgs::new()).is_ok());
    }

    #[test]
    fn authenticated_requires_a_principal() {
        let args = InvocationArgs::new();
        assert_eq!(
            decide(&Policy::Authenticated, None, &args),
            Err(AccessError::NotAuthenticated)
        );
        let p = principal(&["ROLE_USER"]);
        assert!(decide(&Policy::Authenticated, Some(&p), &args).is_ok());
    }

    #[test]
    fn conjunction_requires_every_role() {
        let policy = Policy::all([Policy::has_role("ADMIN"), Policy::has_role("MANAGER")]);
        let args = InvocationArgs::new();

        let both = principal(&["ROLE_ADMIN", "ROLE_MANAGER"]);
        assert!(decide(&policy, Some(&both), &args).is_ok());

        for subset in [&["ROLE_ADMIN"][..], &["ROLE_MANAGER"][..], &[][..]] {
            let p = principal(subset);
            assert_eq!(
                decide(&policy, Some(&p), &args),
                Err(AccessError::InsufficientAuthority),
                "expected deny for role set {subset:?}"
            );
        }
    }

    #[test]
    fn disjunction_requires_at_least_one_role() {
        let policy = Policy::has_any_role(["ADMIN", "MANAGER"]);
        let args = InvocationArgs::new();

        let manager = principal(&["ROLE_MANAGER"]);
        assert!(decide(&policy, Some(&manager), &args).is_ok());

        let user = principal(&["ROLE_USER"]);
        assert_eq!(
            decide(&policy, Some(&user), &args),
            Err(AccessError::InsufficientAuthority)
        );
    }

    #[test]
    fn authority_built_from_argument() {
        let policy =
            Policy::has_authority(AuthorityExpr::arg("resource").then_literal(":read"));
        let args: InvocationArgs = [("resource", "user")].into_iter().collect();

        let reader = principal(&["ROLE_USER"]); // holds user:read
        assert!(decide(&policy, Some(&reader), &args).is_ok());

        // role:read alone does not satisfy user:read.
        let manager_only = {
            let r = Role::new(
                RoleId::new(),
                RoleName::new("ROLE_SUPPORT").unwrap(),
                [crate::Permission::RoleRead].into_iter().collect(),
                Utc::now(),
            );
            Principal::from_roles(PrincipalId::new(), "s@example.com", [&r])
        };
        assert_eq!(
            decide(&policy, Some(&manager_only), &args),
            Err(AccessError::InsufficientAuthority)
        );
    }

    #[test]
    fn self_or_authority_matches_own_subject() {
        let policy = Policy::self_or_authority("user:delete", "email");
        let user = principal(&["ROLE_USER"]); // no user:delete

        let own = InvocationArgs::new().with("email", " Alice@Example.com ");
        assert!(decide(&policy, Some(&user), &own).is_ok());

        let other = InvocationArgs::new().with("email", "mallory@example.com");
        assert_eq!(
            decide(&policy, Some(&user), &other),
            Err(AccessError::InsufficientAuthority)
        );

        let admin = principal(&["ROLE_ADMIN"]); // holds user:delete
        assert!(decide(&policy, Some(&admin), &other).is_ok());
    }

    #[test]
    fn missing_argument_fails_loudly_even_when_another_branch_grants() {
        let policy = Policy::any([
            Policy::has_role("ADMIN"),
            Policy::has_authority(AuthorityExpr::arg("resource").then_literal(":read")),
        ]);
        let admin = principal(&["ROLE_ADMIN"]);

        // The first branch would grant, but the unreferenced argument is
        // still a configuration fault.
        assert_eq!(
            decide(&policy, Some(&admin), &InvocationArgs::new()),
            Err(AccessError::MissingArgument("resource".to_string()))
        );
    }

    #[test]
    fn negation_inverts_a_grant() {
        let policy = Policy::not(Policy::has_role("ADMIN"));
        let args = InvocationArgs::new();

        let admin = principal(&["ROLE_ADMIN"]);
        assert_eq!(
            decide(&policy, Some(&admin), &args),
            Err(AccessError::InsufficientAuthority)
        );

        let user = principal(&["ROLE_USER"]);
        assert!(decide(&policy, Some(&user), &args).is_ok());
    }

    #[test]
    fn empty_conjunction_grants_empty_disjunction_denies() {
        let p = principal(&["ROLE_USER"]);
        let args = InvocationArgs::new();
        assert!(decide(&Policy::all([]), Some(&p), &args).is_ok());
        assert_eq!(
            decide(&Policy::any([]), Some(&p), &args),
            Err(AccessError::InsufficientAuthority)
        );
    }

    #[test]
    fn explanation_serializes_with_denial_kind() {
        let policy = Policy::has_authority("admin:access");
        let user = principal(&["ROLE_USER"]);

        let explanation = explain(&policy, Some(&user), &InvocationArgs::new());
        assert!(!explanation.granted);
        assert_eq!(explanation.denial, Some(DenialKind::InsufficientAuthority));

        let json = serde_json::to_value(&explanation).unwrap();
        assert_eq!(json["denial"], "insufficient_authority");
        assert_eq!(json["granted"], false);

        let granted = explain(&policy, Some(&principal(&["ROLE_ADMIN"])), &InvocationArgs::new());
        assert!(granted.granted);
        assert!(granted.denial.is_none());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        const NAMES: [&str; 4] = ["ROLE_USER", "ROLE_MANAGER", "ROLE_ADMIN", "ROLE_SUPPORT"];

        fn leaves(mask: u8) -> Vec<Policy> {
            NAMES
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, n)| Policy::has_role(*n))
                .collect()
        }

        proptest! {
            /// Property: permuting the children of All/Any never changes the
            /// decision for a fixed principal.
            #[test]
            fn decision_is_order_independent(held_mask in 0u8..16, policy_mask in 1u8..16) {
                let held: Vec<&str> = NAMES
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| held_mask & (1 << i) != 0)
                    .map(|(_, n)| *n)
                    .collect();
                let p = principal(&held);
                let args = InvocationArgs::new();

                let forward = leaves(policy_mask);
                let mut reversed = forward.clone();
                reversed.reverse();

                prop_assert_eq!(
                    decide(&Policy::All(forward.clone()), Some(&p), &args),
                    decide(&Policy::All(reversed.clone()), Some(&p), &args)
                );
                prop_assert_eq!(
                    decide(&Policy::Any(forward), Some(&p), &args),
                    decide(&Policy::Any(reversed), Some(&p), &args)
                );
            }

            /// Property: De Morgan — Not(Any(..)) ≡ All(Not(..)).
            #[test]
            fn negation_respects_de_morgan(held_mask in 0u8..16, policy_mask in 1u8..16) {
                let held: Vec<&str> = NAMES
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| held_mask & (1 << i) != 0)
                    .map(|(_, n)| *n)
                    .collect();
                let p = principal(&held);
                let args = InvocationArgs::new();

                let branches = leaves(policy_mask);
                let not_any = Policy::not(Policy::Any(branches.clone()));
                let all_not = Policy::All(branches.into_iter().map(Policy::not).collect());

                prop_assert_eq!(
                    decide(&not_any, Some(&p), &args),
                    decide(&all_not, Some(&p), &args)
                );
            }
        }
    }
}
