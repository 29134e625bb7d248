//! Infrastructure layer: in-memory collaborator implementations.
//!
//! `warden-auth` defines the ports; this crate provides the single-process
//! implementations — a role store with the role ↔ principal index tables and
//! a principal source deriving snapshots from them.

pub mod role_store;
pub mod telemetry;


pub use role_store::{AssignmentError, InMemoryRoleStore};
