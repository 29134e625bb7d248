//! Role storage adapters.

mod in_memory;

pub use in_memory::{AssignmentError, InMemoryRoleStore};
