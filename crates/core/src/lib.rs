//! `warden-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod id;
pub mod value_object;

pub use entity::Entity;
pub use id::{PrincipalId, RoleId};
pub use value_object::ValueObject;
