//! Typed access policy algebra.
//!
//! Policies are fixed at the point a protected operation is declared and are
//! combined from a closed set of predicates with AND / OR / NOT. There is no
//! runtime expression parsing: a policy is ordinary Rust data, so a typo is a
//! compile error rather than an injection surface.
//!
//! ```
//! use warden_auth::{AuthorityExpr, Policy};
//!
//! // hasAuthority('user:update') or #email == authentication.name
//! let change_password = Policy::any([
//!     Policy::has_authority("user:update"),
//!     Policy::self_claim("email"),
//! ]);
//!
//! // hasAuthority(#resource + ':read')
//! let read_resource = Policy::has_authority(AuthorityExpr::arg("resource").then_literal(":read"));
//! # let _ = (change_password, read_resource);
//! ```

use std::borrow::Cow;
use std::collections::BTreeSet;

/// One segment of an authority token expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(Cow<'static, str>),
    /// Reference to a named invocation argument, resolved at call time.
    Arg(Cow<'static, str>),
}

/// An authority token built from literals and invocation arguments.
///
/// Resolution happens in the decision engine before matching; a referenced
/// argument missing from the invocation context is a configuration fault,
/// never a quiet deny.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorityExpr {
    segments: Vec<Segment>,
}

impl AuthorityExpr {
    pub fn literal(token: impl Into<Cow<'static, str>>) -> Self {
        Self {
            segments: vec![Segment::Literal(token.into())],
        }
    }

    pub fn arg(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            segments: vec![Segment::Arg(name.into())],
        }
    }

    pub fn then_literal(mut self, token: impl Into<Cow<'static, str>>) -> Self {
        self.segments.push(Segment::Literal(token.into()));
        self
    }

    pub fn then_arg(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.segments.push(Segment::Arg(name.into()));
        self
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    fn collect_args(&self, out: &mut BTreeSet<String>) {
        for segment in &self.segments {
            if let Segment::Arg(name) = segment {
                out.insert(name.to_string());
            }
        }
    }
}

impl From<&'static str> for AuthorityExpr {
    fn from(token: &'static str) -> Self {
        AuthorityExpr::literal(token)
    }
}

impl From<String> for AuthorityExpr {
    fn from(token: String) -> Self {
        AuthorityExpr::literal(token)
    }
}

/// The fixed boolean expression guarding a protected operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Policy {
    /// Always grants; no principal required.
    Anonymous,
    /// Grants iff an authenticated principal is present.
    Authenticated,
    /// Grants iff the named role (or its `ROLE_`-prefixed form) is held.
    HasRole(Cow<'static, str>),
    /// Grants iff at least one of the named roles is held.
    HasAnyRole(Vec<Cow<'static, str>>),
    /// Grants iff the resolved token is in the principal's authority set.
    HasAuthority(AuthorityExpr),
    /// Grants iff the authority is held **or** the named invocation argument
    /// equals the principal's own subject claim.
    SelfOrAuthority {
        authority: AuthorityExpr,
        arg: Cow<'static, str>,
    },
    /// Conjunction: every branch must grant. Empty conjunction grants.
    All(Vec<Policy>),
    /// Disjunction: at least one branch must grant. Empty disjunction denies.
    Any(Vec<Policy>),
    Not(Box<Policy>),
}

impl Policy {
    pub fn has_role(name: impl Into<Cow<'static, str>>) -> Self {
        Policy::HasRole(name.into())
    }

    pub fn has_any_role<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Cow<'static, str>>,
    {
        Policy::HasAnyRole(names.into_iter().map(Into::into).collect())
    }

    pub fn has_authority(expr: impl Into<AuthorityExpr>) -> Self {
        Policy::HasAuthority(expr.into())
    }

    pub fn self_or_authority(
        authority: impl Into<AuthorityExpr>,
        arg: impl Into<Cow<'static, str>>,
    ) -> Self {
        Policy::SelfOrAuthority {
            authority: authority.into(),
            arg: arg.into(),
        }
    }

    /// Shorthand for "the named argument is the caller's own identity".
    ///
    /// Expressed as a `SelfOrAuthority` whose authority half can never match
    /// (the empty token is not in any catalog).
    pub fn self_claim(arg: impl Into<Cow<'static, str>>) -> Self {
        Policy::SelfOrAuthority {
            authority: AuthorityExpr::literal(""),
            arg: arg.into(),
        }
    }

    pub fn all(branches: impl IntoIterator<Item = Policy>) -> Self {
        Policy::All(branches.into_iter().collect())
    }

    pub fn any(branches: impl IntoIterator<Item = Policy>) -> Self {
        Policy::Any(branches.into_iter().collect())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: Policy) -> Self {
        Policy::Not(Box::new(inner))
    }

    /// Every invocation argument name this policy can reference, across all
    /// branches regardless of short-circuiting.
    pub fn referenced_args(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_args(&mut out);
        out
    }

    fn collect_args(&self, out: &mut BTreeSet<String>) {
        match self {
            Policy::Anonymous
            | Policy::Authenticated
            | Policy::HasRole(_)
            | Policy::HasAnyRole(_) => {}
            Policy::HasAuthority(expr) => expr.collect_args(out),
            Policy::SelfOrAuthority { authority, arg } => {
                authority.collect_args(out);
                out.insert(arg.to_string());
            }
            Policy::All(branches) | Policy::Any(branches) => {
                for branch in branches {
                    branch.collect_args(out);
                }
            }
            Policy::Not(inner) => inner.collect_args(out),
        }
    }
}
