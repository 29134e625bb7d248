//! Entity trait: identity + continuity across state changes.

/// Marker + minimal interface for domain entities.
///
/// An entity is defined by its identifier, not its attributes: a role that
/// is renamed is still the same role.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
