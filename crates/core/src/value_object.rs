//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are domain objects that are **immutable** and **compared by
/// value**. Two value objects with the same values are considered equal.
/// `Permission` and `RoleName` are value objects; `Role` is an entity.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
