//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Quotes, orders, instances and subscriptions are all stored under their own
/// identifier, so the store layer can persist any `Entity` without being told
/// the key separately (see [`crate::store::EntityStore`]).
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
