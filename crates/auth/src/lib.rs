//! `warden-auth` — pure authorization decision core.
//!
//! This crate is intentionally decoupled from HTTP and storage: it models the
//! permission catalog, the static role hierarchy, roles and principals, and
//! evaluates typed access policies against principal snapshots. Persistence
//! and transport layers plug in through the ports in [`store`].

pub mod decision;
pub mod hierarchy;
pub mod lifecycle;
pub mod permission;
pub mod policy;
pub mod principal;
pub mod role;
pub mod store;

pub use decision::{AccessError, DecisionExplanation, InvocationArgs, decide, explain};
pub use lifecycle::{RoleError, RoleManager};
pub use permission::Permission;
pub use policy::{AuthorityExpr, Policy};
pub use principal::Principal;
pub use role::{InvalidRoleName, Role, RoleName};
pub use store::{PrincipalSource, RoleStore};
